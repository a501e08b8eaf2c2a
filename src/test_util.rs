//! Drives the real router in-process and carries the session cookie
//! between requests like a browser would.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use crate::{app::build_app, auth::session::SESSION_COOKIE, state::AppState};

pub struct TestClient {
    app: Router,
    pub state: AppState,
    pub cookie: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: build_app(state.clone()),
            state,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(form).unwrap();
        let req = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let res = self.app.clone().oneshot(req).await.unwrap();
        self.remember_cookie(&res);

        let status = res.status();
        let location = res
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn remember_cookie(&mut self, res: &Response) {
        let prefix = format!("{SESSION_COOKIE}=");
        for value in res.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if !pair.starts_with(&prefix) {
                continue;
            }
            self.cookie = if pair.len() == prefix.len() {
                None
            } else {
                Some(pair.to_string())
            };
        }
    }

    /// Registers `name` with `name@example.com` / `pw-{name}` and logs in.
    pub async fn register_and_login(&mut self, name: &str) {
        let email = format!("{name}@example.com");
        let password = format!("pw-{name}");
        let res = self
            .post(
                "/register",
                &[
                    ("username", name),
                    ("email", email.as_str()),
                    ("password", password.as_str()),
                    ("confirm_password", password.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{}", res.body);

        let res = self
            .post("/login", &[("email", email.as_str()), ("password", password.as_str())])
            .await;
        assert_eq!(res.location.as_deref(), Some("/dashboard"), "{}", res.body);
    }
}

impl TestResponse {
    /// Value of the hidden CSRF input on the rendered form.
    pub fn csrf_token(&self) -> Option<String> {
        let marker = "name=\"csrf_token\" value=\"";
        let start = self.body.find(marker)? + marker.len();
        let len = self.body[start..].find('"')?;
        Some(self.body[start..start + len].to_string())
    }
}
