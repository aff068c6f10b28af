use kronoterm_cloud::{HeatingLoop, KronotermClient};
use std::env;

#[tokio::main]
async fn main() -> kronoterm_cloud::Result<()> {
    tracing_subscriber::fmt::init();

    let user = env::var("KRONOTERM_CLOUD_USER").expect("KRONOTERM_CLOUD_USER not set");
    let password = env::var("KRONOTERM_CLOUD_PASSWORD").expect("KRONOTERM_CLOUD_PASSWORD not set");

    let mut client = KronotermClient::builder(user, password).build()?;
    client.login().await?;

    let info = client.heat_pump_info().await?;
    println!("{info:#?}");
    println!("{}", "-".repeat(25));

    println!("initial: {}", client.initial_data().await?);
    println!("basic: {}", client.basic_data().await?);
    println!("system review: {}", client.system_review_data().await?);
    println!("alarms: {:?}", client.alarms().await?);
    println!("{}", "-".repeat(25));

    println!(
        "outside {:.1}\u{00b0}C | room {:.1}\u{00b0}C | reservoir {:.1}\u{00b0}C | outlet {:.1}\u{00b0}C | sanitary {:.1}\u{00b0}C",
        client.outside_temperature().await?,
        client.room_temperature().await?,
        client.reservoir_temperature().await?,
        client.outlet_temperature().await?,
        client.sanitary_water_temperature().await?,
    );
    println!(
        "function: {:?} | operating mode: {:?}",
        client.working_function().await?,
        client.heat_pump_operating_mode().await?,
    );

    for heating_loop in HeatingLoop::ALL {
        println!(
            "[{heating_loop}] target {:.1}\u{00b0}C | mode: {:?} | status: {:?}",
            client.heating_loop_target_temperature(heating_loop).await?,
            client.heating_loop_mode(heating_loop).await?,
            client.heating_loop_status(heating_loop).await?,
        );
    }

    println!("{:?}", client.theoretical_power_consumption().await?);
    Ok(())
}
