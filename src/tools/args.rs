use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::OpsError;
use crate::transport::OpsRequest;

fn default_constituent() -> String {
    "biblio".to_string()
}
fn default_range() -> String {
    "1-25".to_string()
}
fn default_depth() -> String {
    "1".to_string()
}

/// Deserialize tool arguments, treating a missing/`null` argument object as `{}`.
pub(super) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, OpsError> {
    let arguments = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|err| OpsError::InvalidParams(format!("{tool}: {err}")))
}

fn require_non_empty(tool: &str, field: &str, value: &str) -> Result<(), OpsError> {
    if value.trim().is_empty() {
        return Err(OpsError::InvalidParams(format!(
            "{tool}: '{field}' must not be empty"
        )));
    }
    Ok(())
}

/// A resolved fetch: the request to send, the parameters to echo back, and the
/// envelope key that will carry the decoded document.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub request: OpsRequest,
    pub echo: Map<String, Value>,
    pub result_key: &'static str,
}

fn echo_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AuthenticateArgs {
    pub consumer_key: String,
    pub consumer_secret: String,
}

// ---------------------------------------------------------------------------
// Search (published data and EP register)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_constituent")]
    pub constituent: String,
    #[serde(default = "default_range")]
    pub range_param: String,
}

/// Which search service a [`SearchArgs`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchService {
    PublishedData,
    Register,
}

impl SearchService {
    fn root(self) -> &'static str {
        match self {
            SearchService::PublishedData => "published-data",
            SearchService::Register => "register",
        }
    }
}

impl SearchArgs {
    pub(super) fn plan(self, tool: &str, service: SearchService) -> Result<FetchPlan, OpsError> {
        require_non_empty(tool, "query", &self.query)?;
        let mut pieces = vec![service.root(), "search"];
        // The bibliographic constituent is the service default and has no path segment.
        if self.constituent != "biblio" {
            pieces.push(self.constituent.as_str());
        }
        let request = OpsRequest::new(pieces)
            .with_query("q", self.query.as_str())
            .with_query("Range", self.range_param.as_str());
        Ok(FetchPlan {
            request,
            echo: echo_object(json!({
                "query": self.query,
                "constituent": self.constituent,
                "range": self.range_param,
            })),
            result_key: "results",
        })
    }
}

// ---------------------------------------------------------------------------
// Published-data retrieval by reference
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReferenceArgs {
    pub reference_type: String,
    pub reference_format: String,
    pub number: String,
}

impl ReferenceArgs {
    fn validate(&self, tool: &str) -> Result<(), OpsError> {
        require_non_empty(tool, "reference_type", &self.reference_type)?;
        require_non_empty(tool, "reference_format", &self.reference_format)?;
        require_non_empty(tool, "number", &self.number)
    }

    fn echo(&self) -> Map<String, Value> {
        echo_object(json!({
            "reference_type": self.reference_type,
            "reference_format": self.reference_format,
            "number": self.number,
        }))
    }

    fn pieces<'a>(&'a self, root: &'a str) -> Vec<&'a str> {
        vec![
            root,
            self.reference_type.as_str(),
            self.reference_format.as_str(),
            self.number.as_str(),
        ]
    }
}

/// Published-data constituents retrievable for a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedConstituent {
    Biblio,
    Abstract,
    Claims,
    Description,
    Equivalents,
}

impl PublishedConstituent {
    fn segment(self) -> &'static str {
        match self {
            PublishedConstituent::Biblio => "biblio",
            PublishedConstituent::Abstract => "abstract",
            PublishedConstituent::Claims => "claims",
            PublishedConstituent::Description => "description",
            PublishedConstituent::Equivalents => "equivalents",
        }
    }

    fn result_key(self) -> &'static str {
        match self {
            PublishedConstituent::Biblio => "biblio_data",
            PublishedConstituent::Abstract => "abstract_data",
            PublishedConstituent::Claims => "claims_data",
            PublishedConstituent::Description => "description_data",
            PublishedConstituent::Equivalents => "equivalents_data",
        }
    }
}

impl ReferenceArgs {
    pub(super) fn published_plan(
        self,
        tool: &str,
        constituent: PublishedConstituent,
    ) -> Result<FetchPlan, OpsError> {
        self.validate(tool)?;
        let mut pieces = self.pieces("published-data");
        pieces.push(constituent.segment());
        Ok(FetchPlan {
            request: OpsRequest::new(pieces),
            echo: self.echo(),
            result_key: constituent.result_key(),
        })
    }

    pub(super) fn legal_plan(self, tool: &str) -> Result<FetchPlan, OpsError> {
        self.validate(tool)?;
        Ok(FetchPlan {
            request: OpsRequest::new(self.pieces("legal")),
            echo: self.echo(),
            result_key: "legal_data",
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FamilyArgs {
    #[serde(flatten)]
    pub reference: ReferenceArgs,
    #[serde(default)]
    pub include_biblio: bool,
}

impl FamilyArgs {
    pub(super) fn plan(self, tool: &str) -> Result<FetchPlan, OpsError> {
        self.reference.validate(tool)?;
        let mut pieces = self.reference.pieces("family");
        if self.include_biblio {
            pieces.push("biblio");
        }
        let request = OpsRequest::new(pieces);
        let mut echo = self.reference.echo();
        echo.insert("include_biblio".into(), Value::Bool(self.include_biblio));
        Ok(FetchPlan {
            request,
            echo,
            result_key: "family_data",
        })
    }
}

// ---------------------------------------------------------------------------
// CPC classification
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CpcArgs {
    pub cpc_class: String,
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub ancestors: bool,
    #[serde(default)]
    pub navigation: bool,
    #[serde(default = "default_depth")]
    pub depth: String,
}

impl CpcArgs {
    pub(super) fn plan(self, tool: &str) -> Result<FetchPlan, OpsError> {
        require_non_empty(tool, "cpc_class", &self.cpc_class)?;
        let subclass = self
            .subclass
            .as_deref()
            .filter(|subclass| !subclass.trim().is_empty());

        let mut pieces = vec!["classification", "cpc", self.cpc_class.as_str()];
        if let Some(subclass) = subclass {
            pieces.push(subclass);
        }
        let mut request = OpsRequest::new(pieces);
        if self.ancestors {
            request = request.with_query("ancestors", "true");
        }
        if self.navigation {
            request = request.with_query("navigation", "true");
        }
        if self.depth != "1" {
            request = request.with_query("depth", self.depth.as_str());
        }

        Ok(FetchPlan {
            request,
            echo: echo_object(json!({
                "cpc_class": self.cpc_class,
                "subclass": subclass,
                "ancestors": self.ancestors,
                "navigation": self.navigation,
                "depth": self.depth,
            })),
            result_key: "classification_data",
        })
    }
}

// ---------------------------------------------------------------------------
// Number conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ConvertArgs {
    pub reference_type: String,
    pub input_format: String,
    pub number: String,
    pub output_format: String,
}

impl ConvertArgs {
    pub(super) fn plan(self, tool: &str) -> Result<FetchPlan, OpsError> {
        require_non_empty(tool, "reference_type", &self.reference_type)?;
        require_non_empty(tool, "input_format", &self.input_format)?;
        require_non_empty(tool, "number", &self.number)?;
        require_non_empty(tool, "output_format", &self.output_format)?;
        let request = OpsRequest::new([
            "number-service",
            self.reference_type.as_str(),
            self.input_format.as_str(),
            self.number.as_str(),
            self.output_format.as_str(),
        ]);
        Ok(FetchPlan {
            request,
            echo: echo_object(json!({
                "reference_type": self.reference_type,
                "input_format": self.input_format,
                "input_number": self.number,
                "output_format": self.output_format,
            })),
            result_key: "conversion_result",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceArgs {
        ReferenceArgs {
            reference_type: "publication".into(),
            reference_format: "epodoc".into(),
            number: "EP1000000".into(),
        }
    }

    #[test]
    fn test_search_biblio_has_no_constituent_segment() {
        let args: SearchArgs = parse_args("search_patents", json!({"query": "ti=solar"})).unwrap();
        let plan = args.plan("search_patents", SearchService::PublishedData).unwrap();
        assert_eq!(plan.request.endpoint(), "/published-data/search");
        assert_eq!(
            plan.request.query(),
            [
                ("q".to_string(), "ti=solar".to_string()),
                ("Range".to_string(), "1-25".to_string())
            ]
        );
        assert_eq!(plan.echo["range"], "1-25");
        assert_eq!(plan.result_key, "results");
    }

    #[test]
    fn test_register_search_with_constituent() {
        let args: SearchArgs = parse_args(
            "search_register_data",
            json!({"query": "pa=ACME", "constituent": "events", "range_param": "1-5"}),
        )
        .unwrap();
        let plan = args.plan("search_register_data", SearchService::Register).unwrap();
        assert_eq!(plan.request.endpoint(), "/register/search/events");
        assert_eq!(plan.echo["constituent"], "events");
    }

    #[test]
    fn test_search_requires_query() {
        let err = parse_args::<SearchArgs>("search_patents", json!({})).unwrap_err();
        assert!(matches!(err, OpsError::InvalidParams(_)));
        assert!(err.to_string().contains("query"));

        let args: SearchArgs = parse_args("search_patents", json!({"query": " "})).unwrap();
        assert!(args.plan("search_patents", SearchService::PublishedData).is_err());
    }

    #[test]
    fn test_published_constituent_plans() {
        let plan = reference()
            .published_plan("get_patent_claims", PublishedConstituent::Claims)
            .unwrap();
        assert_eq!(
            plan.request.endpoint(),
            "/published-data/publication/epodoc/EP1000000/claims"
        );
        assert_eq!(plan.result_key, "claims_data");
        assert_eq!(plan.echo["number"], "EP1000000");
    }

    #[test]
    fn test_family_with_biblio() {
        let args: FamilyArgs = parse_args(
            "get_patent_family",
            json!({
                "reference_type": "publication",
                "reference_format": "docdb",
                "number": "EP.1000000.A1",
                "include_biblio": true
            }),
        )
        .unwrap();
        let plan = args.plan("get_patent_family").unwrap();
        assert_eq!(
            plan.request.endpoint(),
            "/family/publication/docdb/EP.1000000.A1/biblio"
        );
        assert_eq!(plan.echo["include_biblio"], true);
    }

    #[test]
    fn test_legal_plan() {
        let plan = reference().legal_plan("get_legal_data").unwrap();
        assert_eq!(plan.request.endpoint(), "/legal/publication/epodoc/EP1000000");
        assert_eq!(plan.result_key, "legal_data");
    }

    #[test]
    fn test_cpc_plan_query_flags() {
        let args: CpcArgs = parse_args(
            "get_cpc_classification",
            json!({"cpc_class": "A01B", "subclass": "00", "ancestors": true, "depth": "2"}),
        )
        .unwrap();
        let plan = args.plan("get_cpc_classification").unwrap();
        assert_eq!(plan.request.endpoint(), "/classification/cpc/A01B/00");
        assert_eq!(
            plan.request.query(),
            [
                ("ancestors".to_string(), "true".to_string()),
                ("depth".to_string(), "2".to_string())
            ]
        );
        assert_eq!(plan.echo["subclass"], "00");
        assert_eq!(plan.echo["navigation"], false);
    }

    #[test]
    fn test_cpc_plan_defaults() {
        let args: CpcArgs =
            parse_args("get_cpc_classification", json!({"cpc_class": "H04W"})).unwrap();
        let plan = args.plan("get_cpc_classification").unwrap();
        assert_eq!(plan.request.endpoint(), "/classification/cpc/H04W");
        assert!(plan.request.query().is_empty());
        assert!(plan.echo["subclass"].is_null());
    }

    #[test]
    fn test_convert_plan_echo() {
        let args: ConvertArgs = parse_args(
            "convert_patent_number",
            json!({
                "reference_type": "application",
                "input_format": "original",
                "number": "JP.2006-147056.A",
                "output_format": "docdb"
            }),
        )
        .unwrap();
        let plan = args.plan("convert_patent_number").unwrap();
        assert_eq!(
            plan.request.endpoint(),
            "/number-service/application/original/JP.2006-147056.A/docdb"
        );
        assert_eq!(plan.echo["input_number"], "JP.2006-147056.A");
        assert_eq!(plan.result_key, "conversion_result");
    }

    #[test]
    fn test_null_arguments_are_empty_object() {
        let err = parse_args::<ReferenceArgs>("get_patent_biblio", Value::Null).unwrap_err();
        assert!(err.to_string().contains("reference_type"));
    }

    #[test]
    fn test_wrong_type_is_invalid_params() {
        let err = parse_args::<FamilyArgs>(
            "get_patent_family",
            json!({
                "reference_type": "publication",
                "reference_format": "docdb",
                "number": "EP1",
                "include_biblio": "yes"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, OpsError::InvalidParams(_)));
    }
}
