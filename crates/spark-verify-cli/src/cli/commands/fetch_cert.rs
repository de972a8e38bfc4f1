use std::io::Write;

use spark_verify::{CertificateId, StatusClass, ValidationPipeline, VerifierConfig};
use tracing::info;

use crate::cli::args::FetchCertArgs;
use crate::exit_codes;

pub async fn run(args: FetchCertArgs, config: &VerifierConfig) -> anyhow::Result<i32> {
    let id = match CertificateId::parse(&args.id) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{e}");
            return Ok(exit_codes::CLIENT_ERROR);
        }
    };

    let pipeline = match ValidationPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return Ok(exit_codes::SERVER_ERROR);
        }
    };

    match pipeline.resolver().resolve_certificate(&id).await {
        Ok(resolved) => {
            info!(
                certificate_id = %id,
                source = %resolved.source,
                fingerprint = %resolved.key.fingerprint(),
                "certificate resolved"
            );
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&resolved.record.pem)?;
            stdout.flush()?;
            Ok(exit_codes::SUCCESS)
        }
        Err(reason) => {
            eprintln!("certificate {id} could not be resolved: {reason}");
            Ok(match reason.status_class() {
                StatusClass::ClientError => exit_codes::CLIENT_ERROR,
                StatusClass::ServerError => exit_codes::SERVER_ERROR,
            })
        }
    }
}
