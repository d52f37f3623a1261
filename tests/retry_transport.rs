use std::{
    cell::RefCell,
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use browser_request::{
    Body, RawResponse, RequestClient, RequestError, RequestOptions, Result, Transport,
    TransportRequest,
};

/// In-memory transport that replays a script of outcomes and records every
/// request it receives.
#[derive(Default)]
struct ScriptedTransport {
    script: RefCell<VecDeque<(Duration, Result<RawResponse>)>>,
    seen: RefCell<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new(script: Vec<(Duration, Result<RawResponse>)>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn attempts(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse> {
        self.seen.borrow_mut().push(request.clone());
        let (delay, outcome) = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| (Duration::ZERO, Err(RequestError::transport("script exhausted"))));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

fn ok(status: u16, body: &str) -> (Duration, Result<RawResponse>) {
    (
        Duration::ZERO,
        Ok(RawResponse {
            status,
            raw_headers: "Content-Type: text/plain\r\n".to_owned(),
            body: body.to_owned(),
        }),
    )
}

fn fail(message: &str) -> (Duration, Result<RawResponse>) {
    (Duration::ZERO, Err(RequestError::transport(message)))
}

fn client(transport: &ScriptedTransport) -> RequestClient<&ScriptedTransport> {
    RequestClient::with_transport(transport).with_page_host("app.example.com")
}

#[tokio::test]
async fn fails_twice_then_succeeds_after_two_delays() {
    let transport = ScriptedTransport::new(vec![fail("down"), fail("down"), ok(200, "up")]);
    let options = RequestOptions::new()
        .with_retry()
        .with_max_retries(2)
        .with_retry_delay_ms(10);

    let started = Instant::now();
    let response = client(&transport)
        .request("GET", "/api", &options)
        .await
        .expect("third attempt succeeds");

    assert_eq!(response.body, "up");
    assert_eq!(transport.attempts(), 3);
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[tokio::test]
async fn ceiling_bounds_total_attempts() {
    let transport = ScriptedTransport::new(Vec::new());
    let options = RequestOptions::new()
        .with_retry()
        .with_max_retries(3)
        .with_retry_delay_ms(1);

    let err = client(&transport)
        .get("/api", &options)
        .await
        .expect_err("every attempt fails");

    assert_eq!(err, RequestError::transport("script exhausted"));
    assert_eq!(transport.attempts(), 4);
}

#[tokio::test]
async fn zero_max_retries_means_single_attempt() {
    let transport = ScriptedTransport::new(vec![ok(500, "boom"), ok(200, "unused")]);
    let options = RequestOptions::new().with_retry().with_max_retries(0);

    let response = client(&transport).get("/api", &options).await.expect("response");

    assert_eq!(response.status, 500);
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test]
async fn predicate_refusing_first_error_makes_one_attempt() {
    let transport = ScriptedTransport::new(vec![fail("down"), ok(200, "unused")]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = RequestOptions::new().retry_if(move |err, res, attempt| {
        counter.fetch_add(1, Ordering::SeqCst);
        assert!(err.is_some());
        assert!(res.is_none());
        assert_eq!(attempt, 1);
        false
    });

    let err = client(&transport)
        .get("/api", &options)
        .await
        .expect_err("first error is final");

    assert!(matches!(err, RequestError::Transport(_)));
    assert_eq!(transport.attempts(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn predicate_can_retry_successful_statuses() {
    let transport = ScriptedTransport::new(vec![ok(202, "pending"), ok(200, "ready")]);
    let options = RequestOptions::new()
        .retry_if(|_, res, _| res.is_some_and(|res| res.status == 202))
        .with_retry_delay_ms(1);

    let response = client(&transport).get("/job", &options).await.expect("response");

    assert_eq!(response.body, "ready");
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn non_get_methods_are_sent_once() {
    for method in ["POST", "PUT", "DELETE", "HEAD"] {
        let transport = ScriptedTransport::new(vec![fail("down"), ok(200, "unused")]);
        let options = RequestOptions::new().with_retry().with_retry_delay_ms(1);

        let err = client(&transport)
            .request(method, "/api", &options)
            .await
            .expect_err("no retry");

        assert!(matches!(err, RequestError::Transport(_)), "{method}");
        assert_eq!(transport.attempts(), 1, "{method}");
    }
}

#[tokio::test]
async fn lower_case_get_still_engages_retry() {
    let transport = ScriptedTransport::new(vec![ok(503, "busy"), ok(200, "ok")]);
    let options = RequestOptions::new().with_retry().with_retry_delay_ms(1);

    let response = client(&transport).request("get", "/api", &options).await.expect("ok");

    assert_eq!(response.status, 200);
    assert_eq!(transport.seen.borrow()[0].method, "GET");
}

#[tokio::test]
async fn retry_attempts_carry_only_qs_headers_and_timeout() {
    let transport = ScriptedTransport::new(vec![ok(500, "boom"), ok(200, "ok")]);
    let options = RequestOptions::new()
        .with_qs([("page", "1")])
        .with_header("X-Token", "secret")
        .with_body("payload")
        .with_credentials(true)
        .with_timeout_ms(1_000)
        .with_retry()
        .with_retry_delay_ms(1);

    client(&transport).get("/api", &options).await.expect("ok");

    let seen = transport.seen.borrow();
    assert_eq!(seen.len(), 2);
    for request in seen.iter() {
        assert_eq!(request.url, "/api?page=1");
        assert_eq!(request.headers.get("X-Token"), Some("secret"));
        assert_eq!(request.headers.get("X-Requested-With"), Some("XMLHttpRequest"));
        assert_eq!(request.timeout_ms, 1_000);
        assert_eq!(request.body, None);
        assert!(!request.with_credentials);
    }
}

#[tokio::test]
async fn single_shot_get_keeps_body_and_credentials() {
    let transport = ScriptedTransport::new(vec![ok(200, "ok")]);
    let options = RequestOptions::new()
        .with_body("payload")
        .with_credentials(true);

    client(&transport).get("/api", &options).await.expect("ok");

    let seen = transport.seen.borrow();
    assert_eq!(seen[0].body, Some(Body::Text("payload".to_owned())));
    assert!(seen[0].with_credentials);
}

#[tokio::test]
async fn timed_out_attempt_is_retried() {
    let transport = ScriptedTransport::new(vec![
        (Duration::from_millis(300), Ok(RawResponse {
            status: 200,
            raw_headers: String::new(),
            body: "too late".to_owned(),
        })),
        ok(200, "fast"),
    ]);
    let seen_timeout = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen_timeout);
    let options = RequestOptions::new()
        .with_timeout_ms(25)
        .retry_if(move |err, _, _| {
            if err.is_some_and(RequestError::is_timeout) {
                counter.fetch_add(1, Ordering::SeqCst);
                return true;
            }
            false
        })
        .with_retry_delay_ms(1);

    let response = client(&transport).get("/api", &options).await.expect("second attempt");

    assert_eq!(response.body, "fast");
    assert_eq!(seen_timeout.load(Ordering::SeqCst), 1);
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn computed_delay_is_consulted_per_retry() {
    let transport = ScriptedTransport::new(vec![fail("a"), fail("b"), ok(200, "ok")]);
    let attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = Arc::clone(&attempts);
    let options = RequestOptions::new()
        .with_retry()
        .retry_delay_with(move |_, _, attempt| {
            recorder.lock().expect("not poisoned").push(attempt);
            Duration::from_millis(2)
        });

    client(&transport).get("/api", &options).await.expect("ok");

    assert_eq!(*attempts.lock().expect("not poisoned"), vec![1, 2]);
}

#[tokio::test]
async fn cross_origin_attempts_skip_requested_with() {
    let transport = ScriptedTransport::new(vec![ok(200, "ok")]);

    client(&transport)
        .get("https://api.other.com/v1", &RequestOptions::new())
        .await
        .expect("ok");

    assert!(!transport.seen.borrow()[0].headers.contains("x-requested-with"));
}
