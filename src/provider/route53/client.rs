#![cfg_attr(test, allow(dead_code))]

use std::time::Duration;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::trace;
use reqwest::{
    blocking::{Client, RequestBuilder},
    Method,
};

use super::{
    sigv4::{AwsCredentials, SigV4Signer, SignableRequest},
    types::{
        ChangeBatch, ChangeInfo, ChangeResourceRecordSetsResponse, ErrorResponse, HostedZone,
        InvalidChangeBatch, ListHostedZonesResponse,
    },
};
use crate::provider::{collect_pages, ProviderError};

const ROUTE53_HOST: &str = "route53.amazonaws.com";
// Route53 is a global service, requests are always signed for us-east-1
const ROUTE53_SIGNING_REGION: &str = "us-east-1";
const ROUTE53_SERVICE: &str = "route53";
const ROUTE53_API_PATH: &str = "/2013-04-01";
const ROUTE53_ZONE_PAGE_SIZE: &str = "100";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

impl From<quick_xml::DeError> for ProviderError {
    fn from(e: quick_xml::DeError) -> Self {
        ProviderError::Internal(e.to_string())
    }
}

/// Minimal client for the Route53 REST API, signing each request with SigV4
pub struct Route53Client {
    http: Client,
    signer: SigV4Signer,
}

impl Route53Client {
    pub fn try_new(credentials: AwsCredentials) -> Result<Route53Client, ProviderError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProviderError::Setup(e.to_string()))?;

        Ok(Route53Client {
            http,
            signer: SigV4Signer::new(credentials, ROUTE53_SIGNING_REGION, ROUTE53_SERVICE),
        })
    }

    // Build a request carrying its SigV4 signature
    fn signed_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        payload: String,
        now: DateTime<Utc>,
    ) -> Result<RequestBuilder, ProviderError> {
        let content_headers: &[(&str, &str)] = if payload.is_empty() {
            &[]
        } else {
            &[("content-type", "application/xml")]
        };

        let signed = self.signer.sign(
            &SignableRequest {
                method: method.as_str(),
                host: ROUTE53_HOST,
                path,
                query,
                headers: content_headers,
                payload: payload.as_bytes(),
            },
            now,
        )?;

        let mut request = self
            .http
            .request(method, format!("https://{}{}", ROUTE53_HOST, path))
            .query(query);
        for (name, value) in content_headers {
            request = request.header(*name, *value);
        }
        for (name, value) in signed {
            request = request.header(name, value);
        }
        Ok(request.body(payload))
    }

    // Sign and send a request, returning the response body of a successful call
    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<String, ProviderError> {
        let res = self
            .signed_request(method, path, query, body.unwrap_or_default(), Utc::now())?
            .send()?;
        let status = res.status();
        let text = res.text()?;
        trace!("Route53 responded with {}: {}", status, text);

        if !status.is_success() {
            return Err(api_error(status, &text));
        }
        Ok(text)
    }

    pub fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ProviderError> {
        let path = format!("{}/hostedzone", ROUTE53_API_PATH);

        collect_pages(|marker| {
            let mut query = vec![("maxitems", ROUTE53_ZONE_PAGE_SIZE)];
            if let Some(m) = marker {
                query.push(("marker", m));
            }
            let page: ListHostedZonesResponse =
                quick_xml::de::from_str(&self.send(Method::GET, &path, &query, None)?)?;
            Ok(page.into_page())
        })
    }

    pub fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, ProviderError> {
        let path = format!("{}/hostedzone/{}/rrset/", ROUTE53_API_PATH, zone_id);
        let body = batch.to_xml()?;
        trace!("Submitting change batch {}", body);

        let res: ChangeResourceRecordSetsResponse =
            quick_xml::de::from_str(&self.send(Method::POST, &path, &[], Some(body))?)?;
        Ok(res.change_info)
    }
}

// Render the XML error document returned by Route53
fn api_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    if let Ok(res) = quick_xml::de::from_str::<ErrorResponse>(body) {
        return ProviderError::Api(format!("{}: {}", res.error.code, res.error.message));
    }
    if let Ok(res) = quick_xml::de::from_str::<InvalidChangeBatch>(body) {
        if !res.messages.message.is_empty() {
            return ProviderError::Api(format!(
                "InvalidChangeBatch: {}",
                res.messages.message.iter().join("; ")
            ));
        }
    }
    ProviderError::Api(format!("Route53 returned status {}: {}", status, body))
}

#[cfg(test)]
use mockall::mock;

#[cfg(test)]
mock! {
    pub Route53Client {
        pub fn try_new(credentials: AwsCredentials) -> Result<Self, ProviderError>;
        pub fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ProviderError>;
        pub fn change_resource_record_sets(
            &self,
            zone_id: &str,
            batch: &ChangeBatch,
        ) -> Result<ChangeInfo, ProviderError>;
    }
}
