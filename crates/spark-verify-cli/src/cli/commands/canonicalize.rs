use std::io::Write;

use spark_verify::{canonicalize_request, SignedHeaders};

use super::read_request;
use crate::cli::args::CanonicalizeArgs;
use crate::exit_codes;

pub async fn run(args: CanonicalizeArgs) -> anyhow::Result<i32> {
    let request = read_request(&args.request).await?;
    let headers = SignedHeaders::from(&request.headers);
    let canonical = canonicalize_request(&headers, request.body.as_bytes());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(canonical.as_bytes())?;
    stdout.flush()?;

    Ok(exit_codes::SUCCESS)
}
