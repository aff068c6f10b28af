use kronoterm_cloud::{Error, HeatingLoop, KronotermClient};

fn credentials() -> (String, String) {
    let user = std::env::var("KRONOTERM_CLOUD_USER").expect("KRONOTERM_CLOUD_USER not set");
    let password =
        std::env::var("KRONOTERM_CLOUD_PASSWORD").expect("KRONOTERM_CLOUD_PASSWORD not set");
    (user, password)
}

/// Run with: cargo test --test integration -- --ignored
/// Requires KRONOTERM_CLOUD_USER / KRONOTERM_CLOUD_PASSWORD for a real cloud account.
#[tokio::test]
#[ignore]
async fn login_and_read_views() {
    let (user, password) = credentials();
    let mut client = KronotermClient::builder(user, password).build().unwrap();
    client.login().await.expect("login failed");

    let info = client.heat_pump_info().await.expect("initial view failed");
    assert!(info.hp_id.is_some());

    client.outside_temperature().await.expect("outside temp failed");
    client.heat_pump_operating_mode().await.expect("operating mode failed");
    for heating_loop in HeatingLoop::ALL {
        client
            .heating_loop_mode(heating_loop)
            .await
            .unwrap_or_else(|e| panic!("{heating_loop} mode failed: {e}"));
    }
}

#[tokio::test]
#[ignore]
async fn login_with_unknown_user_fails() {
    let (_, password) = credentials();
    let mut client = KronotermClient::builder("TestUserNonExisting", password)
        .build()
        .unwrap();
    let err = client.login().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "got {err:?}");
}

#[tokio::test]
#[ignore]
async fn target_temperature_set_and_restore() {
    let (user, password) = credentials();
    let mut client = KronotermClient::builder(user, password).build().unwrap();
    client.login().await.expect("login failed");

    let original = client
        .heating_loop_target_temperature(HeatingLoop::Loop1)
        .await
        .unwrap();
    let lowered = ((original - 0.3) * 10.0).round() / 10.0;
    assert!(
        client
            .set_heating_loop_target_temperature(HeatingLoop::Loop1, lowered)
            .await
            .unwrap()
    );

    // The portal takes a while to reflect a change.
    tokio::time::sleep(std::time::Duration::from_secs(15)).await;
    let read_back = client
        .heating_loop_target_temperature(HeatingLoop::Loop1)
        .await
        .unwrap();

    client
        .set_heating_loop_target_temperature(HeatingLoop::Loop1, original)
        .await
        .unwrap();
    assert_eq!(read_back, lowered);
}
