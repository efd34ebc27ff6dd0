//! NewsAPI and Open-Meteo clients against a mock HTTP server.

mod common;

use common::{AIR_QUALITY, json};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxboard_core::{
    AuxiliaryKey, AuxiliaryRecord, AuxiliarySource, Coordinate, CountryCode, FetchError,
    FetchOutcome, provider::{newsapi::NewsApiClient, openmeteo::OpenMeteoClient},
};

fn us() -> AuxiliaryKey {
    AuxiliaryKey::Country("US".parse::<CountryCode>().unwrap())
}

fn troy() -> AuxiliaryKey {
    AuxiliaryKey::Coordinate(Coordinate::new(42.7284, -73.6918).unwrap())
}

#[tokio::test]
async fn news_lists_articles_for_lowercased_country() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("country", "us"))
        .and(query_param("apiKey", "NEWSKEY"))
        .and(query_param("pageSize", "5"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "title": "First",
                    "url": "https://example.com/1",
                    "source": {"id": null, "name": "Wire"}
                },
                {
                    "title": "Second",
                    "url": "https://example.com/2",
                    "source": {"id": null, "name": "Daily"}
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NewsApiClient::new("NEWSKEY".into()).with_base_url(&mock_server.uri());
    let fetched = client.fetch(&us()).await;

    let FetchOutcome::Success(AuxiliaryRecord::News(digest)) = fetched.outcome else {
        panic!("expected news, got {:?}", fetched.outcome);
    };
    assert_eq!(digest.headline, "Top Headlines in US");
    assert_eq!(digest.articles.len(), 2);
    assert_eq!(digest.articles[0].title, "First");
    assert_eq!(digest.articles[1].source_name, "Daily");
}

#[tokio::test]
async fn news_with_no_articles_is_an_empty_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok", "totalResults": 0, "articles": []
        })))
        .mount(&mock_server)
        .await;

    let client = NewsApiClient::new("NEWSKEY".into()).with_base_url(&mock_server.uri());
    let fetched = client.fetch(&us()).await;

    let FetchOutcome::Success(record) = fetched.outcome else { panic!("expected success") };
    assert!(record.is_empty());
}

#[tokio::test]
async fn news_unauthorized_is_an_http_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"
        })))
        .mount(&mock_server)
        .await;

    let client = NewsApiClient::new("BAD".into()).with_base_url(&mock_server.uri());
    let fetched = client.fetch(&us()).await;

    assert_eq!(fetched.outcome, FetchOutcome::Failure(FetchError::Http { status: 401 }));
}

#[tokio::test]
async fn air_quality_reads_current_values() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .and(query_param("latitude", "42.7284"))
        .and(query_param("longitude", "-73.6918"))
        .and(query_param(
            "current",
            "european_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,ozone,sulphur_dioxide",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json(AIR_QUALITY)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClient::new().with_base_url(&mock_server.uri());
    let fetched = client.fetch(&troy()).await;

    let FetchOutcome::Success(AuxiliaryRecord::AirQuality(Some(aq))) = fetched.outcome else {
        panic!("expected readings, got {:?}", fetched.outcome);
    };
    assert_eq!(aq.aqi, Some(21));
    assert_eq!(aq.pm10, Some(9.4));
    assert_eq!(aq.no2, Some(4.1));
    assert_eq!(fetched.headers.api, "open-meteo");
}

#[tokio::test]
async fn air_quality_without_current_is_an_empty_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 0.0, "longitude": 0.0
        })))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClient::new().with_base_url(&mock_server.uri());
    let fetched = client.fetch(&troy()).await;

    assert_eq!(fetched.outcome, FetchOutcome::Success(AuxiliaryRecord::AirQuality(None)));
}

#[tokio::test]
async fn air_quality_server_error_is_an_http_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air-quality"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true, "reason": "Latitude must be in range of -90 to 90°."
        })))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClient::new().with_base_url(&mock_server.uri());
    let fetched = client.fetch(&troy()).await;

    assert_eq!(fetched.outcome, FetchOutcome::Failure(FetchError::Http { status: 400 }));
}

#[tokio::test]
async fn air_quality_rejects_country_keys() {
    let client = OpenMeteoClient::new().with_base_url("http://127.0.0.1:1");
    let fetched = client.fetch(&us()).await;

    assert!(matches!(
        fetched.outcome,
        FetchOutcome::Failure(FetchError::UnsupportedKey { client: "open-meteo", .. })
    ));
}
