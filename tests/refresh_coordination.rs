mod support;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use gymdesk::{
    api::Envelope,
    client::{endpoints, ApiClient, ApiRequest, ClientError},
    config::ClientConfig,
    session::{MemoryStore, Session},
};
use serde_json::Value;
use std::sync::{atomic::Ordering, Arc};
use support::{Backend, Harness, BROKEN_PATH, OTP_PATH, RESOURCE_PATH};

#[tokio::test]
async fn expired_cookie_is_refreshed_and_request_replayed() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;

    let response = harness.client.send(ApiRequest::get(RESOURCE_PATH)).await?;
    let envelope: Envelope = response.json()?;

    assert!(envelope.is_ok());
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 2);
    assert!(harness.navigator.routes().is_empty());
    assert!(!harness.client.is_refreshing());

    // The rotated cookie is in the jar, so the next call goes straight through.
    harness.client.send(ApiRequest::get(RESOURCE_PATH)).await?;
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 3);
    Ok(())
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_delay_ms.store(150, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let calls = (0..8).map(|_| harness.client.send(ApiRequest::get(RESOURCE_PATH)));
    let results = join_all(calls).await;

    for result in results {
        let response = result?;
        assert!(response.status.is_success());
    }
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 16);
    assert!(!harness.client.is_refreshing());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_401s_share_one_refresh_across_threads() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_delay_ms.store(150, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let client = harness.client.clone();
            tokio::spawn(async move { client.send(ApiRequest::get(RESOURCE_PATH)).await })
        })
        .collect();

    for task in join_all(tasks).await {
        task??;
    }
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 12);
    Ok(())
}

#[tokio::test]
async fn refresh_state_resets_between_cycles() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;

    harness.client.send(ApiRequest::get(RESOURCE_PATH)).await?;
    assert_eq!(backend.state.refreshes(), 1);

    backend.state.revoke_access();
    harness.client.send(ApiRequest::get(RESOURCE_PATH)).await?;

    assert_eq!(backend.state.refreshes(), 2);
    assert_eq!(backend.state.hits(), 4);
    assert!(harness.navigator.routes().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_refresh_expires_session_and_returns_original_401() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_status.store(401, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let result = harness.client.send(ApiRequest::get(RESOURCE_PATH)).await;

    match result {
        Err(ClientError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("jwt expired"));
        }
        other => return Err(anyhow!("unexpected result: {other:?}")),
    }
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 1);
    assert_eq!(harness.cached_user()?, None);
    assert_eq!(harness.navigator.routes(), vec!["/".to_string()]);
    assert!(harness.client.session().is_expired());
    Ok(())
}

#[tokio::test]
async fn failed_shared_refresh_navigates_once() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_status.store(500, Ordering::SeqCst);
    backend.state.refresh_delay_ms.store(100, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let calls = (0..5).map(|_| harness.client.send(ApiRequest::get(RESOURCE_PATH)));
    let results = join_all(calls).await;

    assert!(results.iter().all(|result| matches!(
        result,
        Err(ClientError::Http { status: 401, .. })
    )));
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(harness.navigator.routes(), vec!["/".to_string()]);
    Ok(())
}

#[tokio::test]
async fn recovers_after_a_failed_cycle() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_status.store(500, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    assert!(harness
        .client
        .send(ApiRequest::get(RESOURCE_PATH))
        .await
        .is_err());

    backend.state.refresh_status.store(200, Ordering::SeqCst);
    harness.client.send(ApiRequest::get(RESOURCE_PATH)).await?;

    assert_eq!(backend.state.refreshes(), 2);
    Ok(())
}

#[tokio::test]
async fn request_is_retried_at_most_once() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.always_unauthorized.store(true, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let result = harness.client.send(ApiRequest::get(RESOURCE_PATH)).await;

    assert!(matches!(result, Err(ClientError::Http { status: 401, .. })));
    assert_eq!(backend.state.refreshes(), 1);
    assert_eq!(backend.state.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn already_retried_request_passes_401_through() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;

    let result = harness
        .client
        .send(ApiRequest::get(RESOURCE_PATH).mark_retried())
        .await;

    assert!(matches!(result, Err(ClientError::Http { status: 401, .. })));
    assert_eq!(backend.state.refreshes(), 0);
    assert!(harness.navigator.routes().is_empty());
    assert!(harness.cached_user()?.is_some());
    Ok(())
}

#[tokio::test]
async fn admin_verify_401_ends_session_without_refresh() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.verify_status.store(401, Ordering::SeqCst);
    let harness = Harness::new(&backend.url())?;

    let result = harness
        .client
        .send(ApiRequest::get(endpoints::ADMIN_VERIFY_PATH))
        .await;

    match result {
        Err(ClientError::AuthFlow { path, .. }) => {
            assert_eq!(path, endpoints::ADMIN_VERIFY_PATH);
        }
        other => return Err(anyhow!("unexpected result: {other:?}")),
    }
    assert_eq!(backend.state.refreshes(), 0);
    assert_eq!(backend.state.admin_verify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.cached_user()?, None);
    assert_eq!(harness.navigator.routes(), vec!["/".to_string()]);
    Ok(())
}

#[tokio::test]
async fn otp_401_is_not_recovered() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;

    let result: Result<Value, ClientError> = harness
        .client
        .post_json(OTP_PATH, &serde_json::json!({"otp": "123456"}))
        .await;

    assert!(matches!(result, Err(ClientError::AuthFlow { .. })));
    assert_eq!(backend.state.refreshes(), 0);
    Ok(())
}

#[tokio::test]
async fn non_401_errors_pass_through() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;

    let result = harness.client.send(ApiRequest::get(BROKEN_PATH)).await;

    match result {
        Err(ClientError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => return Err(anyhow!("unexpected result: {other:?}")),
    }
    assert_eq!(backend.state.refreshes(), 0);
    assert!(harness.cached_user()?.is_some());
    Ok(())
}

#[tokio::test]
async fn network_failure_skips_refresh() -> Result<()> {
    let url = support::closed_port_url().await?;
    let harness = Harness::new(&url)?;

    let result = harness.client.send(ApiRequest::get(RESOURCE_PATH)).await;

    assert!(matches!(result, Err(ClientError::Network(_))));
    assert!(!harness.client.is_refreshing());
    assert!(harness.cached_user()?.is_some());
    assert!(harness.navigator.routes().is_empty());
    Ok(())
}

#[tokio::test]
async fn headless_client_clears_session_without_navigation() -> Result<()> {
    let backend = Backend::start().await?;
    backend.state.refresh_status.store(403, Ordering::SeqCst);

    let store = Arc::new(MemoryStore::new());
    let session = Session::new(store.clone());
    session.save_user(&gymdesk::session::UserRecord::new("7", "bdm"))?;
    let client = ApiClient::new(&ClientConfig::new(backend.url()), session)?;

    let result = client.send(ApiRequest::get(RESOURCE_PATH)).await;

    assert!(matches!(result, Err(ClientError::Http { status: 401, .. })));
    assert_eq!(client.session().user()?, None);
    Ok(())
}

#[tokio::test]
async fn seeded_cookie_is_sent() -> Result<()> {
    let backend = Backend::start().await?;
    let harness = Harness::new(&backend.url())?;
    harness.client.add_cookie("access_token=token-0");

    let data: Value = harness.client.get_json(RESOURCE_PATH).await?;

    assert_eq!(data.pointer("/data/pagination/total"), Some(&Value::from(1)));
    assert_eq!(backend.state.refreshes(), 0);
    assert_eq!(backend.state.hits(), 1);
    Ok(())
}
