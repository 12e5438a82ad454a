//! Request data normalization stage.

use async_trait::async_trait;
use serde_json::Value;

use super::{Flow, Middleware};
use crate::request::Request;

/// Collects query-string pairs and the fields of a JSON object body into
/// [`Request::data`]. Body fields win over query pairs with the same name.
///
/// Must run after [`JsonBody`](super::JsonBody).
#[derive(Clone, Copy, Debug, Default)]
pub struct DataParser;

#[async_trait]
impl Middleware for DataParser {
    fn name(&self) -> &'static str {
        "data_parser"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        let query: Vec<(String, String)> = req
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let body = match req.json() {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Default::default(),
        };

        let data = req.data_mut();
        for (key, value) in query {
            data.insert(key, Value::String(value));
        }
        data.extend(body);
        Flow::Next
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn merges_query_and_body() {
        let mut req: Request = http::Request::builder()
            .uri("/search?q=rust%20lang&page=2")
            .body(Bytes::new())
            .unwrap()
            .into();
        req.set_json(json!({"page": 3, "limit": 10}));

        assert!(DataParser.handle(&mut req).await.is_next());
        let data = req.data();
        assert_eq!(data["q"], json!("rust lang"));
        assert_eq!(data["page"], json!(3));
        assert_eq!(data["limit"], json!(10));
    }

    #[tokio::test]
    async fn ignores_non_object_bodies() {
        let mut req: Request = http::Request::builder().uri("/").body(Bytes::new()).unwrap().into();
        req.set_json(json!([1, 2, 3]));

        assert!(DataParser.handle(&mut req).await.is_next());
        assert!(req.data().is_empty());
    }
}
