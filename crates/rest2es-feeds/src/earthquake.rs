//! USGS earthquake catalog (FDSN event service, GeoJSON output).
//!
//! Without a context the feed starts at `start_date` and pages through the
//! catalog one day at a time. Once the loaded day is the current UTC day it
//! switches to asking only for events newer than the latest one seen.

use std::future::Future;

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, TimeZone, Timelike, Utc};
use rest2es_core::{Context, Document, Error, Feed, Result, ID_FIELD};
use serde_json::{json, Value};
use tracing::warn;
use url::Url;

pub const USGS_QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

const TIME_FIELD: &str = "time";
const DAYS_OF_WEEK: [&str; 7] = ["Sun", "Mon", "Tues", "Wed", "Thur", "Fri", "Sat"];

#[derive(Debug, Clone)]
pub struct EarthquakeFeed {
    base_url: String,
    start_date: NaiveDate,
}

impl EarthquakeFeed {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            base_url: USGS_QUERY_URL.to_string(),
            start_date,
        }
    }

    /// Point the feed at a different FDSN event endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Target for `context` as seen on `today` (UTC).
    pub fn target_on(&self, context: Option<&Context>, today: NaiveDate) -> Option<String> {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "Invalid earthquake endpoint");
                return None;
            }
        };
        url.query_pairs_mut().append_pair("format", "geojson");

        let range = context.and_then(|ctx| Some((ctx.min_str(TIME_FIELD)?, ctx.max_str(TIME_FIELD)?)));
        let Some((min, max)) = range else {
            let end = self.start_date + Duration::days(1);
            url.query_pairs_mut()
                .append_pair("starttime", &format_date(self.start_date))
                .append_pair("endtime", &format_date(end));
            return Some(url.into());
        };

        let (Some(min), Some(max)) = (parse_utc(min), parse_utc(max)) else {
            warn!(min = %min, max = %max, "Context holds unparseable timestamps");
            return None;
        };

        let min_day = min.date_naive();
        if min_day == today {
            let start = max + Duration::seconds(1);
            url.query_pairs_mut()
                .append_pair("starttime", &format_timestamp(start));
        } else {
            url.query_pairs_mut()
                .append_pair("starttime", &format_date(min_day + Duration::days(1)))
                .append_pair("endtime", &format_date(min_day + Duration::days(2)));
        }
        Some(url.into())
    }

    /// Flatten a GeoJSON feature into an index document.
    pub fn transform_feature(feature: Value) -> Result<Document> {
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Transform("feature has no properties".into()))?;

        let time_ms = props
            .get("time")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Transform("feature has no time".into()))?;
        let time = from_millis(time_ms)?;

        let mut doc = Document::new();

        if let Some(coords) = feature.pointer("/geometry/coordinates").and_then(Value::as_array) {
            if let (Some(lon), Some(lat)) = (coords.first(), coords.get(1)) {
                doc.insert("location".into(), json!({ "lat": lat, "lon": lon }));
            }
        }

        let copy = |doc: &mut Document, from: &str, to: &str| {
            doc.insert(to.into(), props.get(from).cloned().unwrap_or(Value::Null));
        };
        copy(&mut doc, "mag", "magnitude");
        copy(&mut doc, "place", "place");
        copy(&mut doc, "url", "url");
        copy(&mut doc, "sig", "significance");
        copy(&mut doc, "title", "title");

        let day = DAYS_OF_WEEK[time.weekday().num_days_from_sunday() as usize];
        doc.insert("dayOfWeek".into(), json!(day));
        doc.insert("hourOfDay_str".into(), json!(time.hour().to_string()));
        doc.insert("hourOfDay_num".into(), json!(time.hour()));
        doc.insert("time".into(), json!(format_timestamp(time)));

        if let Some(updated_ms) = props.get("updated").and_then(Value::as_i64) {
            doc.insert("updated".into(), json!(format_timestamp(from_millis(updated_ms)?)));
        }

        let tags: Vec<&str> = props
            .get("types")
            .and_then(Value::as_str)
            .map(|types| types.split(',').filter(|t| !t.is_empty()).collect())
            .unwrap_or_default();
        doc.insert("tags".into(), json!(tags));

        if let Some(id) = feature.get("id").filter(|id| !id.is_null()) {
            doc.insert(ID_FIELD.into(), id.clone());
        }

        Ok(doc)
    }
}

impl Default for EarthquakeFeed {
    fn default() -> Self {
        Self::new(NaiveDate::from_ymd_opt(2013, 1, 1).unwrap_or_default())
    }
}

impl Feed for EarthquakeFeed {
    fn build_target(&self, context: Option<&Context>) -> Option<String> {
        self.target_on(context, Utc::now().date_naive())
    }

    fn extract_rows(&self, body: Value) -> Result<Vec<Value>> {
        match body {
            Value::Object(mut obj) => match obj.remove("features") {
                Some(Value::Array(features)) => Ok(features),
                _ => Err(Error::Parse("response has no features array".into())),
            },
            _ => Err(Error::Parse("response is not a GeoJSON object".into())),
        }
    }

    fn transform_record(&self, row: Value) -> impl Future<Output = Result<Document>> + Send {
        async move { Self::transform_feature(row) }
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Transform(format!("timestamp out of range: {}", ms)))
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rest2es_core::FieldRange;

    fn query(target: &str) -> Vec<(String, String)> {
        Url::parse(target)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time_context(min: &str, max: &str) -> Context {
        let mut ctx = Context::new();
        ctx.insert("time", FieldRange { min: json!(min), max: json!(max) });
        ctx
    }

    #[test]
    fn test_cold_start_targets_first_day() {
        let feed = EarthquakeFeed::default();
        let target = feed.target_on(None, day(2024, 6, 1)).unwrap();

        assert!(target.starts_with(USGS_QUERY_URL));
        assert_eq!(
            query(&target),
            pairs(&[
                ("format", "geojson"),
                ("starttime", "2013-01-01"),
                ("endtime", "2013-01-02"),
            ])
        );
    }

    #[test]
    fn test_context_without_time_is_cold_start() {
        let feed = EarthquakeFeed::new(day(2020, 2, 28));
        let target = feed.target_on(Some(&Context::new()), day(2024, 6, 1)).unwrap();
        assert_eq!(
            query(&target),
            pairs(&[
                ("format", "geojson"),
                ("starttime", "2020-02-28"),
                ("endtime", "2020-02-29"),
            ])
        );
    }

    #[test]
    fn test_past_day_pages_to_next_day() {
        let feed = EarthquakeFeed::default();
        let ctx = time_context("2013-01-01T00:04:11.000Z", "2013-01-01T23:50:00.000Z");
        let target = feed.target_on(Some(&ctx), day(2024, 6, 1)).unwrap();
        assert_eq!(
            query(&target),
            pairs(&[
                ("format", "geojson"),
                ("starttime", "2013-01-02"),
                ("endtime", "2013-01-03"),
            ])
        );
    }

    #[test]
    fn test_today_resumes_after_latest_event() {
        let feed = EarthquakeFeed::default();
        let ctx = time_context("2024-06-01T00:10:00.000Z", "2024-06-01T08:30:15.250Z");
        let target = feed.target_on(Some(&ctx), day(2024, 6, 1)).unwrap();
        assert_eq!(
            query(&target),
            pairs(&[
                ("format", "geojson"),
                ("starttime", "2024-06-01T08:30:16.250Z"),
            ])
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let feed = EarthquakeFeed::default().with_base_url("http://localhost:8080/fdsnws/event/1/query");
        let target = feed.target_on(None, day(2024, 6, 1)).unwrap();
        assert!(target.starts_with("http://localhost:8080/fdsnws/event/1/query?format=geojson&"));

        let feed = EarthquakeFeed::default().with_base_url("not a url");
        assert_eq!(feed.target_on(None, day(2024, 6, 1)), None);
    }

    #[test]
    fn test_unparseable_context_has_no_target() {
        let feed = EarthquakeFeed::default();
        let ctx = time_context("yesterday", "today");
        assert_eq!(feed.target_on(Some(&ctx), day(2024, 6, 1)), None);
    }

    #[test]
    fn test_extract_rows() {
        let feed = EarthquakeFeed::default();
        let rows = feed
            .extract_rows(json!({"type": "FeatureCollection", "features": [{"id": "a"}, {"id": "b"}]}))
            .unwrap();
        assert_eq!(rows.len(), 2);

        assert!(matches!(feed.extract_rows(json!({"type": "x"})), Err(Error::Parse(_))));
        assert!(matches!(feed.extract_rows(json!([])), Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_transform_feature() {
        let feature = json!({
            "type": "Feature",
            "id": "ci11238130",
            "properties": {
                "mag": 1.37,
                "place": "12km SSW of Idyllwild, CA",
                // 2013-01-01T05:07:22.640Z, a Tuesday
                "time": 1357016842640i64,
                "updated": 1357017086000i64,
                "url": "https://earthquake.usgs.gov/earthquakes/eventpage/ci11238130",
                "sig": 29,
                "types": ",cap,focal-mechanism,nearby-cities,origin,",
                "title": "M 1.4 - 12km SSW of Idyllwild, CA"
            },
            "geometry": {"type": "Point", "coordinates": [-116.7776667, 33.6633333, 13.4]}
        });

        let doc = EarthquakeFeed::default().transform_record(feature).await.unwrap();

        assert_eq!(doc["_id"], json!("ci11238130"));
        assert_eq!(doc["location"], json!({"lat": 33.6633333, "lon": -116.7776667}));
        assert_eq!(doc["magnitude"], json!(1.37));
        assert_eq!(doc["place"], json!("12km SSW of Idyllwild, CA"));
        assert_eq!(doc["time"], json!("2013-01-01T05:07:22.640Z"));
        assert_eq!(doc["updated"], json!("2013-01-01T05:11:26.000Z"));
        assert_eq!(doc["dayOfWeek"], json!("Tues"));
        assert_eq!(doc["hourOfDay_str"], json!("5"));
        assert_eq!(doc["hourOfDay_num"], json!(5));
        assert_eq!(doc["significance"], json!(29));
        assert_eq!(
            doc["tags"],
            json!(["cap", "focal-mechanism", "nearby-cities", "origin"])
        );
        assert!(!doc.contains_key("properties"));
        assert!(!doc.contains_key("geometry"));
        assert!(!doc.contains_key("type"));
    }

    #[test]
    fn test_transform_requires_time() {
        let feature = json!({"id": "x", "properties": {"mag": 1.0}});
        assert!(matches!(
            EarthquakeFeed::transform_feature(feature),
            Err(Error::Transform(_))
        ));
    }
}
