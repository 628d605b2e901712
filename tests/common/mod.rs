#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Write `content` to a uniquely named file in the temp directory.
    pub fn create_temp_file(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "nubes_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            ulid::Ulid::new(),
            ext
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_file(content, "yaml")
    }

    /// Best effort
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod fixtures {
    use http::Method;
    use nubes::pipeline::{Outcome, RequestContext};
    use nubes::security::{AuthProvider, Credentials};
    use nubes::server::Request;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Filter that appends `tag;` to the response body.
    pub fn writer(tag: &'static str) -> impl Fn(&mut RequestContext) -> Outcome + Send + Sync {
        move |ctx: &mut RequestContext| {
            ctx.response.write(&format!("{tag};"));
            Outcome::Continue
        }
    }

    /// Shared log of stage names, for flows where the body is replaced.
    #[derive(Clone, Default)]
    pub struct Trace(Arc<Mutex<Vec<String>>>);

    impl Trace {
        pub fn push(&self, entry: &str) {
            self.0.lock().push(entry.to_string());
        }

        pub fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }

        /// Filter that records `tag` and continues.
        pub fn filter(&self, tag: &'static str) -> impl Fn(&mut RequestContext) -> Outcome + Send + Sync {
            let trace = self.clone();
            move |_: &mut RequestContext| {
                trace.push(tag);
                Outcome::Continue
            }
        }
    }

    pub fn get(target: &str) -> Request {
        Request::builder(Method::GET, target).build()
    }

    /// Fixed credential table.
    ///
    /// - basic `alice:secret`
    /// - bearer `good-token`
    /// - api token `key-1`
    /// - session `sess-1`
    pub struct StaticUsers;

    impl AuthProvider for StaticUsers {
        fn authenticate(&self, credentials: &Credentials) -> Option<Value> {
            match credentials {
                Credentials::Basic { username, password }
                    if username == "alice" && password == "secret" =>
                {
                    Some(json!({ "user": "alice" }))
                }
                Credentials::Bearer(token) if token == "good-token" => Some(json!({ "user": "jwt" })),
                Credentials::ApiToken(token) if token == "key-1" => Some(json!({ "user": "service" })),
                Credentials::Session(id) if id == "sess-1" => Some(json!({ "user": "browser" })),
                _ => None,
            }
        }
    }
}
