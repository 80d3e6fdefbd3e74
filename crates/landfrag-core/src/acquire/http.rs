//! Blocking HTTP client for the raster service.
//!
//! Wire protocol (JSON over POST, relative to the configured endpoint):
//!
//! | path            | body                                   | response                    |
//! |-----------------|----------------------------------------|-----------------------------|
//! | `classify`      | [`ClassifyRequest`]                    | `{"raster": "<handle>"}`    |
//! | `histogram`     | `{"raster": ..}` + [`HistogramRequest`] | `{"histogram": {..} \| null}` |
//! | `download-url`  | `{"raster": ..}` + [`DownloadRequest`]  | `{"url": "<export url>"}`   |
//!
//! Export URLs are fetched with a plain GET.
use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{ClassifyRequest, DownloadRequest, HistogramRequest, RasterHandle, RasterService};
use crate::config::ServiceConfig;
use crate::error::{LandfragError, Result};

#[derive(Clone)]
pub struct HttpRasterService {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct WithRaster<'a, T> {
    raster: &'a RasterHandle,
    #[serde(flatten)]
    request: &'a T,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    raster: RasterHandle,
}

#[derive(Deserialize)]
struct HistogramResponse {
    #[serde(default)]
    histogram: Option<BTreeMap<String, f64>>,
}

#[derive(Deserialize)]
struct DownloadUrlResponse {
    url: String,
}

impl HttpRasterService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(LandfragError::RemoteQuery(
                "raster service endpoint is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every failure, transport or status, is a `RemoteQuery` error naming
    /// `path`.
    fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.endpoint, path);
        trace!(%url, "POST");
        let query_err = |e: reqwest::Error| LandfragError::RemoteQuery(format!("{path}: {e}"));

        let resp = self.client.post(&url).json(body).send().map_err(query_err)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LandfragError::RemoteQuery(format!(
                "{path} returned {status}: {body}"
            )));
        }
        resp.json().map_err(query_err)
    }
}

impl RasterService for HttpRasterService {
    fn classify(&self, request: &ClassifyRequest) -> Result<RasterHandle> {
        let resp: ClassifyResponse = self.post("classify", request)?;
        Ok(resp.raster)
    }

    fn histogram(
        &self,
        raster: &RasterHandle,
        request: &HistogramRequest,
    ) -> Result<Option<BTreeMap<String, f64>>> {
        let resp: HistogramResponse = self.post("histogram", &WithRaster { raster, request })?;
        Ok(resp.histogram)
    }

    fn download_url(&self, raster: &RasterHandle, request: &DownloadRequest) -> Result<String> {
        let resp: DownloadUrlResponse =
            self.post("download-url", &WithRaster { raster, request })?;
        Ok(resp.url)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        trace!(%url, "GET");
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}
