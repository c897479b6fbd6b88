use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::RawQuery;
use axum::response::IntoResponse;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

use narvik::application::ports::{RecognitionClient, RecognitionError};
use narvik::domain::{
    LanguageTag, NormalizedAudio, PcmSpec, RecognitionConfig, SpeakerDiarization,
};
use narvik::infrastructure::speech::{Credentials, GoogleSpeechClient};

struct CapturedCall {
    query: Option<String>,
    payload: serde_json::Value,
}

type Captured = Arc<Mutex<Vec<CapturedCall>>>;

async fn start_mock_speech_server(
    response_status: u16,
    response_body: &'static str,
) -> (String, Captured, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let app = Router::new().route(
        "/v1/speech:recognize",
        post(move |RawQuery(query): RawQuery, body: String| {
            let sink = Arc::clone(&sink);
            async move {
                if let Ok(payload) = serde_json::from_str(&body) {
                    sink.lock().await.push(CapturedCall { query, payload });
                }
                let status = axum::http::StatusCode::from_u16(response_status).unwrap();
                (status, response_body).into_response()
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = format!("http://{}/v1/speech:recognize", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (endpoint, captured, shutdown_tx)
}

fn api_key_client(endpoint: &str) -> GoogleSpeechClient {
    GoogleSpeechClient::new(
        Credentials::resolve(None, Some("test-key")).unwrap(),
        endpoint,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn mono_audio() -> NormalizedAudio {
    NormalizedAudio::new(vec![1, 2, 3, 4], PcmSpec::new(16_000, 1))
}

fn config() -> RecognitionConfig {
    RecognitionConfig {
        language: LanguageTag::parse("ru-RU").unwrap(),
        punctuation: true,
        profanity_filter: false,
        word_time_offsets: true,
        model: "default".to_string(),
        diarization: None,
    }
}

const SUCCESS_BODY: &str = r#"{
    "results": [
        {
            "alternatives": [
                {
                    "transcript": "привет мир",
                    "confidence": 0.92,
                    "words": [
                        {"startTime": "0s", "endTime": "1.200s", "word": "привет", "speakerTag": 1},
                        {"startTime": "1.200s", "endTime": "2.500s", "word": "мир", "speakerTag": 2}
                    ]
                }
            ],
            "channelTag": 0,
            "resultEndTime": "2.500s"
        }
    ]
}"#;

#[tokio::test]
async fn given_successful_response_when_recognizing_then_maps_to_domain_result() {
    let (endpoint, _captured, shutdown_tx) = start_mock_speech_server(200, SUCCESS_BODY).await;
    let client = api_key_client(&endpoint);

    let result = client.recognize(&mono_audio(), &config()).await.unwrap();

    assert_eq!(result.segments.len(), 1);
    let segment = &result.segments[0];
    assert_eq!(segment.channel, Some(0));
    assert_eq!(segment.end_offset_seconds, Some(2.5));
    let alternative = &segment.alternatives[0];
    assert_eq!(alternative.transcript, "привет мир");
    assert!((alternative.confidence - 0.92).abs() < 1e-6);
    assert_eq!(alternative.words.len(), 2);
    assert_eq!(alternative.words[0].word, "привет");
    assert_eq!(alternative.words[0].start_seconds, 0.0);
    assert_eq!(alternative.words[0].end_seconds, 1.2);
    assert_eq!(alternative.words[1].speaker, Some(2));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_mono_audio_when_recognizing_then_sends_linear16_payload() {
    let (endpoint, captured, shutdown_tx) = start_mock_speech_server(200, "{}").await;
    let client = api_key_client(&endpoint);

    client.recognize(&mono_audio(), &config()).await.unwrap();

    let calls = captured.lock().await;
    assert_eq!(calls.len(), 1);
    let config_payload = &calls[0].payload["config"];
    assert_eq!(config_payload["encoding"], "LINEAR16");
    assert_eq!(config_payload["sampleRateHertz"], 16000);
    assert_eq!(config_payload["languageCode"], "ru-RU");
    assert_eq!(config_payload["enableAutomaticPunctuation"], true);
    assert_eq!(config_payload["profanityFilter"], false);
    assert_eq!(config_payload["enableWordTimeOffsets"], true);
    assert_eq!(config_payload["model"], "default");
    assert_eq!(config_payload["useEnhanced"], true);
    assert!(config_payload.get("audioChannelCount").is_none());
    assert!(config_payload.get("diarizationConfig").is_none());
    assert_eq!(calls[0].payload["audio"]["content"], "AQIDBA==");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_multichannel_audio_when_recognizing_then_sends_channel_count() {
    let (endpoint, captured, shutdown_tx) = start_mock_speech_server(200, "{}").await;
    let client = api_key_client(&endpoint);
    let audio = NormalizedAudio::new(vec![0u8; 8], PcmSpec::new(44_100, 2));

    client.recognize(&audio, &config()).await.unwrap();

    let calls = captured.lock().await;
    let config_payload = &calls[0].payload["config"];
    assert_eq!(config_payload["sampleRateHertz"], 44100);
    assert_eq!(config_payload["audioChannelCount"], 2);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_diarization_enabled_when_recognizing_then_sends_symmetric_speaker_bounds() {
    let (endpoint, captured, shutdown_tx) = start_mock_speech_server(200, "{}").await;
    let client = api_key_client(&endpoint);
    let mut with_speakers = config();
    with_speakers.diarization = Some(SpeakerDiarization { speaker_count: 3 });

    client.recognize(&mono_audio(), &with_speakers).await.unwrap();

    let calls = captured.lock().await;
    let diarization = &calls[0].payload["config"]["diarizationConfig"];
    assert_eq!(diarization["enableSpeakerDiarization"], true);
    assert_eq!(diarization["minSpeakerCount"], 3);
    assert_eq!(diarization["maxSpeakerCount"], 3);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_api_key_credentials_when_recognizing_then_key_travels_in_query() {
    let (endpoint, captured, shutdown_tx) = start_mock_speech_server(200, "{}").await;
    let client = api_key_client(&endpoint);

    client.recognize(&mono_audio(), &config()).await.unwrap();

    let calls = captured.lock().await;
    let query = calls[0].query.as_deref().unwrap_or_default();
    assert!(query.contains("key=test-key"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unauthorized_response_when_recognizing_then_returns_authentication_error() {
    let body = r#"{"error": {"status": "UNAUTHENTICATED"}}"#;
    let (endpoint, _captured, shutdown_tx) = start_mock_speech_server(401, body).await;
    let client = api_key_client(&endpoint);

    let outcome = client.recognize(&mono_audio(), &config()).await;

    assert!(matches!(outcome, Err(RecognitionError::Authentication(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_forbidden_response_when_recognizing_then_returns_authentication_error() {
    let body = r#"{"error": {"status": "PERMISSION_DENIED"}}"#;
    let (endpoint, _captured, shutdown_tx) = start_mock_speech_server(403, body).await;
    let client = api_key_client(&endpoint);

    let outcome = client.recognize(&mono_audio(), &config()).await;

    assert!(matches!(outcome, Err(RecognitionError::Authentication(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_server_error_when_recognizing_then_surfaces_provider_body_verbatim() {
    let body = r#"{"error": {"message": "backend exploded"}}"#;
    let (endpoint, _captured, shutdown_tx) = start_mock_speech_server(500, body).await;
    let client = api_key_client(&endpoint);

    let outcome = client.recognize(&mono_audio(), &config()).await;

    match outcome {
        Err(RecognitionError::Provider { status, body: raw }) => {
            assert_eq!(status, 500);
            assert_eq!(raw, body);
        }
        other => panic!("expected provider error, got {:?}", other),
    }
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_empty_results_when_recognizing_then_returns_empty_domain_result() {
    let (endpoint, _captured, shutdown_tx) = start_mock_speech_server(200, "{}").await;
    let client = api_key_client(&endpoint);

    let result = client.recognize(&mono_audio(), &config()).await.unwrap();

    assert!(result.is_empty());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unreachable_endpoint_when_recognizing_then_returns_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = api_key_client(&format!("http://{}/v1/speech:recognize", addr));
    let outcome = client.recognize(&mono_audio(), &config()).await;

    assert!(matches!(outcome, Err(RecognitionError::Network(_))));
}
