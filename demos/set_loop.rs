use kronoterm_cloud::{HeatingLoop, KronotermClient};
use std::env;

#[tokio::main]
async fn main() -> kronoterm_cloud::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let usage = "usage: set_loop <1|2|5> <temperature>";
    let heating_loop = args
        .get(1)
        .and_then(|a| a.parse().ok())
        .and_then(HeatingLoop::from_kronoterm)
        .expect(usage);
    let temperature: f64 = args.get(2).and_then(|a| a.parse().ok()).expect(usage);

    let user = env::var("KRONOTERM_CLOUD_USER").expect("KRONOTERM_CLOUD_USER not set");
    let password = env::var("KRONOTERM_CLOUD_PASSWORD").expect("KRONOTERM_CLOUD_PASSWORD not set");

    let mut client = KronotermClient::builder(user, password).build()?;
    client.login().await?;

    let before = client.heating_loop_target_temperature(heating_loop).await?;
    println!("[{heating_loop}] current target {before:.1}\u{00b0}C, setting {temperature:.1}\u{00b0}C");

    if client
        .set_heating_loop_target_temperature(heating_loop, temperature)
        .await?
    {
        println!("accepted");
    } else {
        eprintln!("portal rejected the change");
    }
    Ok(())
}
