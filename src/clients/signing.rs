use crate::clients::ProviderCredentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const TERMINATOR: &str = "aws4_request";

/// Headers to attach to a request signed with AWS Signature Version 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to compute the request signature.")]
pub struct SigningError;

/// Signs a form-encoded `POST /` request for `service`.
pub fn sign_form_post(
    credentials: &ProviderCredentials,
    service: &str,
    host: &str,
    content_type: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<SignedHeaders, SigningError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let security_token = credentials
        .session_token
        .as_ref()
        .map(|token| token.expose_secret().to_string());

    let mut canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-amz-date:{}\n",
        content_type.trim(),
        host.trim(),
        amz_date
    );
    let mut signed_headers = String::from("content-type;host;x-amz-date");
    if let Some(token) = &security_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{}\n", token.trim()));
        signed_headers.push_str(";x-amz-security-token");
    }

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers,
        signed_headers,
        hex_sha256(body.as_bytes())
    );
    let scope = format!("{}/{}/{}/{}", date, credentials.region, service, TERMINATOR);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        credentials.secret_key.expose_secret(),
        &date,
        &credentials.region,
        service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key, scope, signed_headers, signature
        ),
        amz_date,
        security_token,
    })
}

pub fn derive_signing_key(
    secret_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let date_key = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date.as_bytes())?;
    let region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let service_key = hmac_sha256(&region_key, service.as_bytes())?;

    hmac_sha256(&service_key, TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError)?;
    mac.update(message);

    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
