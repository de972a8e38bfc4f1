use anyhow::Context;
use serde::Serialize;
use spark_verify::{
    respond, Delivery, MemoryDelivery, SpoolDelivery, StatusClass, ValidationPipeline,
    VerifierConfig,
};

use super::read_request;
use crate::cli::args::ValidateArgs;
use crate::exit_codes;

#[derive(Serialize)]
struct ValidateOutput {
    verified: bool,
    reason: Option<&'static str>,
    status: u16,
    response: &'static str,
}

pub async fn run(args: ValidateArgs, config: &VerifierConfig) -> anyhow::Result<i32> {
    let request = read_request(&args.request).await?;

    let pipeline = match ValidationPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return Ok(exit_codes::SERVER_ERROR);
        }
    };

    let delivery: Box<dyn Delivery> = match &args.spool_dir {
        Some(dir) => Box::new(SpoolDelivery::new(dir)),
        None => Box::new(MemoryDelivery::new()),
    };

    let verdict = pipeline.validate_request(&request).await;
    let response = respond(verdict, delivery.as_ref(), request.body.as_bytes()).await;

    let output = ValidateOutput {
        verified: verdict.is_verified(),
        reason: verdict.reason().map(|r| r.code()),
        status: response.status,
        response: response.body,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to serialize verdict")?
    );

    let code = match verdict.reason() {
        None if response.is_success() => exit_codes::SUCCESS,
        None => exit_codes::SERVER_ERROR,
        Some(reason) => match reason.status_class() {
            StatusClass::ClientError => exit_codes::CLIENT_ERROR,
            StatusClass::ServerError => exit_codes::SERVER_ERROR,
        },
    };
    Ok(code)
}
