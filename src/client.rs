use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use moka::sync::Cache;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{redirect, Method};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, trace, warn};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    consumption_form, enum_field, f64_field, field, i64_field, is_success, last_f64, loop_page,
    optional_string, session_cookie_header, Endpoint, LoginForm, SetParameterForm, API_PATH,
    AUTH_REASON_COOKIE, BROWSER_HEADERS, DEFAULT_BASE_URL, HEATING_CIRCLE_DATA, LOGIN_PATH,
    OPERATING_MODE_PAGE, PARAM_LOOP_STATUS, PARAM_LOOP_TEMP, PARAM_MAIN_MODE, SESSION_COOKIE,
    TEMPERATURES_AND_CONFIG, TREND_CONSUMPTION,
};
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_CACHE_CAPACITY: u64 = 512;

const ERROR_BODY_PREVIEW: usize = 200;

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            headers.insert(name, HeaderValue::from_static(*value));
        }
    }
    headers
}

pub struct KronotermClientBuilder {
    username: String,
    password: String,
    base_url: String,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
    cache: Option<(Duration, u64)>,
}

impl KronotermClientBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            http: None,
            log_mode: None,
            log_path: None,
            cache: None,
        }
    }

    /// Scheme and host of the portal, without a trailing slash.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request timeout. Ignored when a custom client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS).
    /// It should not follow redirects, or the login cookies may be lost.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    /// Cache GET view responses for `ttl`, holding at most `capacity` entries.
    pub fn view_cache(mut self, ttl: Duration, capacity: u64) -> Self {
        self.cache = Some((ttl, capacity));
        self
    }

    pub fn build(self) -> Result<KronotermClient> {
        let http = match self.http {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder().redirect(redirect::Policy::none());
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        let cache = self.cache.map(|(ttl, capacity)| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build()
        });

        Ok(KronotermClient {
            http,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            headers: browser_headers(),
            session_id: None,
            logger,
            cache,
        })
    }
}

/// Session against the Kronoterm cloud portal.
///
/// Starts unauthenticated; [`login`](Self::login) captures the `PHPSESSID`
/// cookie which is then sent with every view and set request. Expiry is not
/// detected: when calls start failing, log in again.
pub struct KronotermClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    headers: HeaderMap,
    session_id: Option<String>,
    logger: Option<MessageLogger>,
    cache: Option<Cache<String, Value>>,
}

impl KronotermClient {
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> KronotermClientBuilder {
        KronotermClientBuilder::new(username, password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The `Cookie` header value attached to API requests, once logged in.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers.get(COOKIE).and_then(|v| v.to_str().ok())
    }

    pub async fn login(&mut self) -> Result<()> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!(url = %url, username = %self.username, "logging in");

        if let Some(ref mut logger) = self.logger {
            logger.log_request("POST", LOGIN_PATH, Some(&json!({ "username": self.username })));
        }

        let form = LoginForm {
            username: &self.username,
            password: &self.password,
        };
        let resp = self
            .http
            .post(&url)
            .headers(browser_headers())
            .form(&form)
            .send()
            .await?;
        let status = resp.status();

        let mut session_id = None;
        let mut auth_reason = None;
        for cookie in resp.cookies() {
            match cookie.name() {
                AUTH_REASON_COOKIE => auth_reason = Some(cookie.value().to_string()),
                SESSION_COOKIE => session_id = Some(cookie.value().to_string()),
                _ => {}
            }
        }

        if let Some(reason) = auth_reason {
            warn!(%reason, %status, "login rejected");
            return Err(Error::Auth(reason));
        }

        // Redirects are a normal login answer; only 4xx/5xx are transport failures.
        resp.error_for_status()?;

        let session_id = session_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            Error::Auth(format!("no {SESSION_COOKIE} cookie (server responded {status})"))
        })?;
        let cookie = HeaderValue::from_str(&session_cookie_header(&session_id))
            .map_err(|_| Error::Auth(format!("unusable {SESSION_COOKIE} cookie value")))?;

        self.headers.insert(COOKIE, cookie);
        self.session_id = Some(session_id);
        if let Some(ref cache) = self.cache {
            cache.invalidate_all();
        }
        info!("logged in and session cookie set");
        Ok(())
    }

    /// GET a view and return its JSON body.
    pub async fn fetch_view(&mut self, endpoint: Endpoint) -> Result<Value> {
        let query = endpoint.query();
        if let Some(view) = self.cache.as_ref().and_then(|c| c.get(query)) {
            trace!(query, "view served from cache");
            return Ok(view);
        }

        let view = self.send::<()>(Method::GET, query, None).await?;
        if let Some(ref cache) = self.cache {
            cache.insert(query.to_string(), view.clone());
        }
        Ok(view)
    }

    /// POST a parameter change. `Ok(true)` only when the portal answers
    /// `"result": "success"`; any other answer is `Ok(false)`.
    pub async fn set_parameter(
        &mut self,
        endpoint: Endpoint,
        param_name: &str,
        param_value: impl fmt::Display,
        page: i32,
    ) -> Result<bool> {
        let form = SetParameterForm {
            param_name,
            param_value: param_value.to_string(),
            page,
        };
        if let Some(ref cache) = self.cache {
            cache.invalidate_all();
        }

        let response = self.send(Method::POST, endpoint.query(), Some(&form)).await?;
        let accepted = is_success(&response);
        if !accepted {
            warn!(param = param_name, value = %form.param_value, page, %response, "parameter change not accepted");
        }
        Ok(accepted)
    }

    async fn send<F: Serialize + ?Sized>(
        &mut self,
        method: Method,
        query: &str,
        form: Option<&F>,
    ) -> Result<Value> {
        if self.session_id.is_none() {
            return Err(Error::NotAuthenticated);
        }

        let url = format!("{}{}?{}", self.base_url, API_PATH, query);
        debug!(%method, query, "sending request");

        if let Some(ref mut logger) = self.logger {
            let body = form.and_then(|f| serde_json::to_value(f).ok());
            logger.log_request(method.as_str(), query, body.as_ref());
        }

        let mut request = self.http.request(method, &url).headers(self.headers.clone());
        if let Some(form) = form {
            request = request.form(form);
        }
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let failure = resp.error_for_status_ref().err();
        let body = resp.text().await?;
        trace!(query, status, body = %body, "response");

        if let Some(err) = failure {
            self.log_unparsed_response(query, status, &body);
            return Err(err.into());
        }

        let value: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) => {
                let preview = self.log_unparsed_response(query, status, &body);
                return Err(Error::InvalidResponse(preview));
            }
        };

        if let Some(ref mut logger) = self.logger {
            logger.log_response(query, status, &value);
        }
        Ok(value)
    }

    /// Log a body that could not be used and return its preview.
    fn log_unparsed_response(&mut self, query: &str, status: u16, body: &str) -> String {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
        if let Some(ref mut logger) = self.logger {
            logger.log_response(query, status, &Value::String(preview.clone()));
        }
        preview
    }

    // -- Views --

    pub async fn initial_data(&mut self) -> Result<Value> {
        self.fetch_view(Endpoint::Initial).await
    }

    pub async fn basic_data(&mut self) -> Result<Value> {
        self.fetch_view(Endpoint::Basic).await
    }

    pub async fn system_review_data(&mut self) -> Result<Value> {
        self.fetch_view(Endpoint::SystemReview).await
    }

    pub async fn shortcuts_data(&mut self) -> Result<Value> {
        self.fetch_view(Endpoint::Shortcuts).await
    }

    pub async fn heating_loop_data(&mut self, heating_loop: HeatingLoop) -> Result<Value> {
        self.fetch_view(Endpoint::loop_view(heating_loop)).await
    }

    pub async fn alarms_data(&mut self) -> Result<Value> {
        self.fetch_view(Endpoint::Alarms).await
    }

    /// Just the `AlarmsData` list of the alarms view.
    pub async fn alarms(&mut self) -> Result<Vec<Value>> {
        let data = self.alarms_data().await?;
        let alarms = field(&data, "/AlarmsData")?;
        alarms.as_array().cloned().ok_or_else(|| Error::InvalidValue {
            field: "/AlarmsData".to_string(),
            value: alarms.to_string(),
        })
    }

    /// Consumption histogram for today.
    pub async fn theoretical_use_data(&mut self) -> Result<Value> {
        self.theoretical_use_data_for(Local::now().date_naive()).await
    }

    pub async fn theoretical_use_data_for(&mut self, date: NaiveDate) -> Result<Value> {
        let form = consumption_form(date);
        self.send(Method::POST, Endpoint::ConsumptionHistogram.query(), Some(form.as_slice()))
            .await
    }

    pub async fn heat_pump_info(&mut self) -> Result<HeatPumpInfo> {
        let data = self.initial_data().await?;
        let active_errors_count = match data.get("ActiveErrorsCnt") {
            None | Some(Value::Null) => None,
            Some(_) => {
                let count = i64_field(&data, "/ActiveErrorsCnt")?;
                Some(u32::try_from(count).map_err(|_| Error::InvalidValue {
                    field: "/ActiveErrorsCnt".to_string(),
                    value: count.to_string(),
                })?)
            }
        };
        Ok(HeatPumpInfo {
            hp_id: optional_string(&data, "hp_id"),
            user_level: optional_string(&data, "user_level"),
            location_name: optional_string(&data, "Location"),
            loop_names: optional_string(&data, "CircleNames"),
            active_errors_count,
        })
    }

    // -- Typed readings --

    async fn basic_f64(&mut self, name: &str) -> Result<f64> {
        let data = self.basic_data().await?;
        f64_field(&data, &format!("{TEMPERATURES_AND_CONFIG}/{name}"))
    }

    /// Outside temperature in °C.
    pub async fn outside_temperature(&mut self) -> Result<f64> {
        self.basic_f64("outside_temp").await
    }

    /// Room temperature in °C, as reported for heating loop 2.
    pub async fn room_temperature(&mut self) -> Result<f64> {
        self.basic_f64("heating_circle_2_temp").await
    }

    pub async fn reservoir_temperature(&mut self) -> Result<f64> {
        self.basic_f64("reservoir_temp").await
    }

    pub async fn sanitary_water_temperature(&mut self) -> Result<f64> {
        self.basic_f64("tap_water_temp").await
    }

    /// Heat pump outlet temperature in °C.
    pub async fn outlet_temperature(&mut self) -> Result<f64> {
        let data = self.system_review_data().await?;
        f64_field(&data, "/CurrentFunctionData/0/dv_temp")
    }

    pub async fn working_function(&mut self) -> Result<WorkingFunction> {
        let data = self.basic_data().await?;
        enum_field(
            &data,
            &format!("{TEMPERATURES_AND_CONFIG}/working_function"),
            WorkingFunction::from_kronoterm,
        )
    }

    pub async fn heat_pump_operating_mode(&mut self) -> Result<HeatPumpOperatingMode> {
        let data = self.basic_data().await?;
        enum_field(
            &data,
            &format!("{TEMPERATURES_AND_CONFIG}/main_mode"),
            HeatPumpOperatingMode::from_kronoterm,
        )
    }

    pub async fn heating_loop_target_temperature(&mut self, heating_loop: HeatingLoop) -> Result<f64> {
        let data = self.heating_loop_data(heating_loop).await?;
        f64_field(&data, &format!("{HEATING_CIRCLE_DATA}/circle_temp"))
    }

    pub async fn heating_loop_status(&mut self, heating_loop: HeatingLoop) -> Result<HeatingLoopStatus> {
        let data = self.heating_loop_data(heating_loop).await?;
        enum_field(
            &data,
            &format!("{HEATING_CIRCLE_DATA}/circle_status"),
            HeatingLoopStatus::from_kronoterm,
        )
    }

    pub async fn heating_loop_mode(&mut self, heating_loop: HeatingLoop) -> Result<HeatingLoopMode> {
        let data = self.heating_loop_data(heating_loop).await?;
        enum_field(
            &data,
            &format!("{HEATING_CIRCLE_DATA}/circle_mode"),
            HeatingLoopMode::from_kronoterm,
        )
    }

    /// Latest daily theoretical consumption, in kWh.
    pub async fn theoretical_power_consumption(&mut self) -> Result<PowerConsumption> {
        let data = self.theoretical_use_data().await?;
        Ok(PowerConsumption::new(
            last_f64(&data, &format!("{TREND_CONSUMPTION}/CompHeating"))?,
            last_f64(&data, &format!("{TREND_CONSUMPTION}/CompActiveCooling"))?,
            last_f64(&data, &format!("{TREND_CONSUMPTION}/CompTapWater"))?,
            last_f64(&data, &format!("{TREND_CONSUMPTION}/CPLoops"))?,
        ))
    }

    // -- Command methods --

    pub async fn set_heating_loop_mode(
        &mut self,
        heating_loop: HeatingLoop,
        mode: HeatingLoopMode,
    ) -> Result<bool> {
        self.set_logged(
            "set_heating_loop_mode",
            Some(heating_loop),
            Endpoint::loop_set(heating_loop),
            PARAM_LOOP_STATUS,
            mode.as_kronoterm(),
            loop_page(heating_loop),
        )
        .await
    }

    pub async fn set_heating_loop_target_temperature(
        &mut self,
        heating_loop: HeatingLoop,
        temperature: f64,
    ) -> Result<bool> {
        if !temperature.is_finite() {
            return Err(Error::InvalidValue {
                field: PARAM_LOOP_TEMP.to_string(),
                value: temperature.to_string(),
            });
        }
        self.set_logged(
            "set_heating_loop_target_temperature",
            Some(heating_loop),
            Endpoint::loop_set(heating_loop),
            PARAM_LOOP_TEMP,
            temperature,
            loop_page(heating_loop),
        )
        .await
    }

    pub async fn set_heat_pump_operating_mode(&mut self, mode: HeatPumpOperatingMode) -> Result<bool> {
        self.set_logged(
            "set_heat_pump_operating_mode",
            None,
            Endpoint::AdvancedSettings,
            PARAM_MAIN_MODE,
            mode.as_kronoterm(),
            OPERATING_MODE_PAGE,
        )
        .await
    }

    async fn set_logged(
        &mut self,
        action: &str,
        heating_loop: Option<HeatingLoop>,
        endpoint: Endpoint,
        param_name: &str,
        param_value: impl fmt::Display,
        page: i32,
    ) -> Result<bool> {
        let param_value = param_value.to_string();
        if let Some(ref mut logger) = self.logger {
            let body = json!({ "param_name": param_name, "param_value": param_value, "page": page });
            logger.log_command(action, heating_loop.map(|l| l.as_kronoterm()), &body);
        }
        debug!(action, loop_id = ?heating_loop, param = param_name, value = %param_value, "setting parameter");
        self.set_parameter(endpoint, param_name, param_value, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_headers_carry_static_block() {
        let headers = browser_headers();
        assert_eq!(headers.len(), BROWSER_HEADERS.len());
        assert!(headers.get("user-agent").unwrap().to_str().unwrap().starts_with("Mozilla/5.0"));
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn builder_trims_base_url() {
        let client = KronotermClient::builder("user", "pass")
            .base_url("http://127.0.0.1:8080/")
            .build()
            .unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8080");
        assert!(!client.is_authenticated());
        assert!(client.cookie_header().is_none());
    }

    #[tokio::test]
    async fn requests_before_login_are_rejected() {
        let mut client = KronotermClient::builder("user", "pass")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = client.basic_data().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated), "got {err:?}");
        let err = client
            .set_heat_pump_operating_mode(HeatPumpOperatingMode::Eco)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated), "got {err:?}");
    }
}
