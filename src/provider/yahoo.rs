//! Yahoo Finance client.
//!
//! Snapshots come from the `quoteSummary` endpoint, which needs a session
//! cookie plus a crumb token; history comes from the `chart` endpoint,
//! which is tried against both query hosts.

use std::sync::Mutex;
use std::time::Duration;

use chrono::DateTime;
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{DataProvider, InfoMap};
use crate::error::{FetchCause, FetchError};
use crate::history::HistoryBar;
use crate::period::HistoryQuery;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_HOSTS: [&str; 2] = [
    "https://query2.finance.yahoo.com",
    "https://query1.finance.yahoo.com",
];

/// Merged in this order; the first module to carry a key wins.
const SUMMARY_MODULES: [&str; 5] = [
    "financialData",
    "summaryDetail",
    "price",
    "defaultKeyStatistics",
    "assetProfile",
];

pub struct YahooClient {
    http: Client,
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(YahooClient {
            http,
            crumb: Mutex::new(None),
        })
    }

    fn crumb(&self, symbol: &str) -> Result<String, FetchError> {
        if let Ok(guard) = self.crumb.lock() {
            if let Some(crumb) = guard.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // Only the session cookie matters here; the page itself is a 404.
        if let Err(e) = self.http.get(COOKIE_URL).send() {
            debug!("cookie request failed: {}", e);
        }

        let response = self
            .http
            .get(CRUMB_URL)
            .send()
            .map_err(|e| FetchError::new(symbol, e.into()))?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::new(symbol, FetchCause::RateLimited));
        }
        if !status.is_success() {
            return Err(FetchError::new(symbol, FetchCause::Status(status.as_u16())));
        }
        let crumb = response
            .text()
            .map_err(|e| FetchError::new(symbol, e.into()))?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::new(symbol, FetchCause::Decode("no crumb token issued".into())));
        }

        debug!("obtained crumb token");
        if let Ok(mut guard) = self.crumb.lock() {
            *guard = Some(crumb.clone());
        }
        Ok(crumb)
    }

    fn invalidate_crumb(&self) {
        if let Ok(mut guard) = self.crumb.lock() {
            *guard = None;
        }
    }
}

/// Append the symbol as one percent-encoded path segment.
fn endpoint(base: &str, symbol: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|e| FetchError::new(symbol, FetchCause::Decode(e.to_string())))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::new(symbol, FetchCause::Decode(format!("{} cannot take a path", base))))?
        .push(symbol);
    Ok(url)
}

impl DataProvider for YahooClient {
    fn info(&self, symbol: &str) -> Result<InfoMap, FetchError> {
        let crumb = self.crumb(symbol)?;
        let url = endpoint(QUOTE_SUMMARY_URL, symbol)?;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .query(&[("modules", SUMMARY_MODULES.join(",")), ("crumb", crumb)])
            .send()
            .map_err(|e| FetchError::new(symbol, e.into()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("crumb rejected for {}, re-authenticating on next fetch", symbol);
            self.invalidate_crumb();
        }
        let text = response.text().map_err(|e| FetchError::new(symbol, e.into()))?;
        decode_quote_summary(symbol, status.as_u16(), &text)
    }

    fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<Vec<HistoryBar>, FetchError> {
        let mut last_error = None;

        for host in CHART_HOSTS {
            let url = endpoint(&format!("{}/v8/finance/chart", host), symbol)?;
            debug!("GET {} range={} interval={}", url, query.period, query.interval);

            let response = self
                .http
                .get(url)
                .query(&[
                    ("range", query.period.to_string()),
                    ("interval", query.interval.to_string()),
                ])
                .send();
            match response {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().map_err(|e| FetchError::new(symbol, e.into()))?;
                    return decode_chart(symbol, status, &text);
                }
                Err(e) => {
                    debug!("{} unreachable: {}", host, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => FetchError::new(symbol, e.into()),
            None => FetchError::new(symbol, FetchCause::Decode("no chart host configured".into())),
        })
    }
}

/// Turn a `quoteSummary` answer into a flat snapshot.
pub fn decode_quote_summary(symbol: &str, status: u16, body: &str) -> Result<InfoMap, FetchError> {
    if status == 429 {
        return Err(FetchError::new(symbol, FetchCause::RateLimited));
    }

    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if let Some(json) = parsed {
        if let Some(description) = error_description(&json["quoteSummary"]["error"])
            .or_else(|| error_description(&json["finance"]["error"]))
        {
            return Err(FetchError::new(symbol, FetchCause::Provider(description)));
        }
        if let Some(result) = json["quoteSummary"]["result"].get(0).and_then(Value::as_object) {
            return Ok(flatten_modules(result));
        }
    }

    Err(FetchError::new(symbol, unexpected_status(status, "missing quoteSummary result")))
}

fn error_description(error: &Value) -> Option<String> {
    error["description"]
        .as_str()
        .or_else(|| error["code"].as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn unexpected_status(status: u16, what: &str) -> FetchCause {
    match status {
        404 => FetchCause::NotFound,
        200..=299 => FetchCause::Decode(what.to_string()),
        other => FetchCause::Status(other),
    }
}

/// Merge the summary modules into one map, unwrapping `{raw, fmt}` pairs.
pub fn flatten_modules(result: &serde_json::Map<String, Value>) -> InfoMap {
    let mut info = InfoMap::new();
    for module in SUMMARY_MODULES {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            if info.contains_key(key) {
                continue;
            }
            if let Some(value) = unwrap_value(value) {
                info.insert(key.clone(), value);
            }
        }
    }
    info
}

fn unwrap_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(obj) if obj.is_empty() => None,
        Value::Object(obj) if obj.contains_key("raw") => obj.get("raw").cloned(),
        other => Some(other.clone()),
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<Option<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turn a `chart` answer into bars. Samples with any gap are dropped.
pub fn decode_chart(symbol: &str, status: u16, body: &str) -> Result<Vec<HistoryBar>, FetchError> {
    if status == 429 {
        return Err(FetchError::new(symbol, FetchCause::RateLimited));
    }

    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Err(FetchError::new(symbol, unexpected_status(status, &e.to_string())));
        }
    };

    if let Some(description) = envelope.chart.error.as_ref().and_then(error_description) {
        return Err(FetchError::new(symbol, FetchCause::Provider(description)));
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::new(symbol, unexpected_status(status, "chart request failed")));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(series) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            Some(HistoryBar {
                timestamp: DateTime::from_timestamp((*ts)?, 0)?,
                open: at(&series.open, i)?,
                high: at(&series.high, i)?,
                low: at(&series.low, i)?,
                close: at(&series.close, i)?,
            })
        })
        .collect();
    Ok(bars)
}
