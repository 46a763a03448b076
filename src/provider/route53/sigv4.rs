//! AWS Signature Version 4 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::provider::ProviderError;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

type HmacSha256 = Hmac<Sha256>;

/// Static AWS credentials
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// The parts of an HTTP request covered by the signature
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
    /// Extra headers to sign, `host` and `x-amz-*` headers are added automatically
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: AwsCredentials, region: &str, service: &str) -> Self {
        SigV4Signer {
            credentials,
            region: region.to_owned(),
            service: service.to_owned(),
        }
    }

    /// Sign a request, returning the headers that have to be sent along with it
    pub fn sign(
        &self,
        request: &SignableRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut added = vec![("x-amz-date".to_string(), amz_date.to_owned())];
        if let Some(token) = &self.credentials.session_token {
            added.push(("x-amz-security-token".to_string(), token.to_owned()));
        }

        let headers = request
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
            .chain(std::iter::once(("host".to_string(), request.host.to_string())))
            .chain(added.iter().cloned())
            .sorted()
            .collect_vec();
        let signed_headers = headers.iter().map(|(k, _)| k.as_str()).join(";");

        let canonical_request = canonical_request(request, &headers, &signed_headers);
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        added.push((
            "authorization".to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
            ),
        ));
        Ok(added)
    }
}

fn canonical_request(request: &SignableRequest, headers: &[(String, String)], signed_headers: &str) -> String {
    let canonical_uri = if request.path.is_empty() {
        "/".to_string()
    } else {
        uri_encode(request.path, false)
    };
    let canonical_query = request
        .query
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .sorted()
        .map(|(k, v)| format!("{}={}", k, v))
        .join("&");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    let payload_hash = hex::encode(Sha256::digest(request.payload));

    [
        request.method,
        canonical_uri.as_str(),
        canonical_query.as_str(),
        canonical_headers.as_str(),
        signed_headers,
        payload_hash.as_str(),
    ]
    .join("\n")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ProviderError::Internal(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, ProviderError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

// Percent-encode everything but unreserved characters, as required for canonical requests
fn uri_encode(s: &str, encode_slash: bool) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            b'/' if !encode_slash => "/".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // Example request from the AWS Signature Version 4 documentation
    const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
    const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn example_request<'a>() -> SignableRequest<'a> {
        SignableRequest {
            method: "GET",
            host: "iam.amazonaws.com",
            path: "/",
            query: &[("Action", "ListUsers"), ("Version", "2010-05-08")],
            headers: &[("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")],
            payload: b"",
        }
    }

    fn signer(session_token: Option<&str>) -> SigV4Signer {
        SigV4Signer::new(
            AwsCredentials {
                access_key_id: ACCESS_KEY_ID.to_string(),
                secret_access_key: SECRET_ACCESS_KEY.to_string(),
                session_token: session_token.map(str::to_string),
            },
            "us-east-1",
            "iam",
        )
    }

    #[test]
    fn should_derive_signing_key() {
        let key = signing_key(SECRET_ACCESS_KEY, "20150830", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn should_build_canonical_request() {
        let request = example_request();
        let headers = vec![
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded; charset=utf-8".to_string(),
            ),
            ("host".to_string(), "iam.amazonaws.com".to_string()),
            ("x-amz-date".to_string(), "20150830T123600Z".to_string()),
        ];
        let canonical = canonical_request(&request, &headers, "content-type;host;x-amz-date");
        assert_eq!(
            canonical,
            "GET\n/\nAction=ListUsers&Version=2010-05-08\n\
             content-type:application/x-www-form-urlencoded; charset=utf-8\n\
             host:iam.amazonaws.com\n\
             x-amz-date:20150830T123600Z\n\n\
             content-type;host;x-amz-date\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(Sha256::digest(canonical.as_bytes())),
            "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
        );
    }

    #[test]
    fn should_sign_example_request() {
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let headers = signer(None).sign(&example_request(), now).unwrap();

        assert_eq!(
            headers,
            vec![
                ("x-amz-date".to_string(), "20150830T123600Z".to_string()),
                (
                    "authorization".to_string(),
                    "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
                     SignedHeaders=content-type;host;x-amz-date, \
                     Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
                        .to_string()
                ),
            ]
        );
    }

    #[test]
    fn should_sign_session_token() {
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let headers = signer(Some("session")).sign(&example_request(), now).unwrap();

        assert_eq!(
            headers[1],
            ("x-amz-security-token".to_string(), "session".to_string())
        );
        assert!(headers[2]
            .1
            .contains("SignedHeaders=content-type;host;x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn should_encode_reserved_characters() {
        assert_eq!(uri_encode("/2013-04-01/hostedzone", false), "/2013-04-01/hostedzone");
        assert_eq!(uri_encode("a b/c", true), "a%20b%2Fc");
        assert_eq!(uri_encode("a+b=c", true), "a%2Bb%3Dc");
    }

    #[test]
    fn should_not_leak_secret() {
        let creds = signer(Some("session")).credentials;
        assert!(!format!("{:?}", creds).contains("EXAMPLEKEY"));
    }
}
