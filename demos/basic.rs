use browser_request::{Query, RequestClient, RequestOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("BROWSER_REQUEST_BASE_URL")
        .unwrap_or_else(|_| "https://httpbin.org/".to_owned());
    let client = RequestClient::with_base_url(&base_url)?;

    let response = client
        .get(
            "/get",
            &RequestOptions::new()
                .with_qs(Query::from([("hello", "world")]))
                .with_timeout_ms(5_000)
                .with_retry()
                .with_max_retries(2),
        )
        .await?;
    println!("{} {}", response.status, response.url);

    let created = client
        .post(
            "/post",
            &RequestOptions::new().with_json(&serde_json::json!({ "name": "Kit" }))?,
        )
        .await?
        .into_body()?;
    println!("{created}");

    Ok(())
}
