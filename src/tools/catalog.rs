use std::sync::OnceLock;

use serde_json::{json, Value};

const REFERENCE_TYPE_DOC: &str =
    "Reference type: \"publication\", \"application\" or \"priority\"";
const REFERENCE_FORMAT_DOC: &str =
    "Reference format: \"docdb\" (EP.1234567.A1) or \"epodoc\" (EP1234567)";

const SEARCH_QUERY_DOC: &str = concat!(
    "CQL search query. Examples: \"ti=artificial intelligence\" (title), ",
    "\"ab=solar panel\" (abstract), \"pa=Google\" (applicant), \"in=John Doe\" (inventor), ",
    "\"ic=A01B\" (classification), \"pd=20200101->20201231\" (publication date), ",
    "\"ti=battery AND pa=Tesla\". Do not wrap values in quotes: in=John Doe, not in=\"John Doe\"."
);

static TOOL_DEFINITIONS: OnceLock<Value> = OnceLock::new();

fn reference_properties() -> Value {
    json!({
        "reference_type": { "type": "string", "description": REFERENCE_TYPE_DOC },
        "reference_format": { "type": "string", "description": REFERENCE_FORMAT_DOC },
        "number": {
            "type": "string",
            "description": "Patent number, e.g. \"EP1000000\" or \"US20050123456\""
        }
    })
}

fn reference_tool(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": reference_properties(),
            "required": ["reference_type", "reference_format", "number"]
        }
    })
}

fn search_tool(name: &str, description: &str, constituents: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": SEARCH_QUERY_DOC },
                "constituent": {
                    "type": "string",
                    "description": constituents,
                    "default": "biblio"
                },
                "range_param": {
                    "type": "string",
                    "description": "Result range, e.g. \"1-25\" or \"26-50\"",
                    "default": "1-25"
                }
            },
            "required": ["query"]
        }
    })
}

fn build_tool_definitions() -> Value {
    let mut family = reference_tool(
        "get_patent_family",
        "Retrieve the INPADOC family of a patent.",
    );
    family["inputSchema"]["properties"]["include_biblio"] = json!({
        "type": "boolean",
        "description": "Include bibliographic data for each family member",
        "default": false
    });

    json!({
        "tools": [
            {
                "name": "authenticate_ops_env",
                "description": "Authenticate with the EPO OPS API using the consumer key and secret from the environment (OPS_ID / OPS_SECRET, .env supported).",
                "inputSchema": { "type": "object", "properties": {} }
            },
            {
                "name": "authenticate_ops",
                "description": "Authenticate with the EPO OPS API using explicit OAuth2 consumer credentials.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "consumer_key": { "type": "string", "description": "OAuth2 consumer key issued by the EPO" },
                        "consumer_secret": { "type": "string", "description": "OAuth2 consumer secret issued by the EPO" }
                    },
                    "required": ["consumer_key", "consumer_secret"]
                }
            },
            search_tool(
                "search_patents",
                "Search published patent data in OPS.",
                "Returned data: \"biblio\", \"abstract\" or \"full-cycle\""
            ),
            reference_tool("get_patent_biblio", "Retrieve the bibliographic data of a patent."),
            reference_tool("get_patent_abstract", "Retrieve the abstract of a patent."),
            reference_tool("get_patent_claims", "Retrieve the claims of a patent."),
            reference_tool("get_patent_description", "Retrieve the full description of a patent."),
            reference_tool("get_patent_equivalents", "Retrieve the simple-family equivalents of a patent."),
            family,
            reference_tool("get_legal_data", "Retrieve the legal status events of a patent."),
            search_tool(
                "search_register_data",
                "Search the European Patent Register.",
                "Returned data: \"biblio\", \"events\", \"procedural-steps\" or \"upp\""
            ),
            {
                "name": "get_cpc_classification",
                "description": "Retrieve CPC classification scheme information.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "cpc_class": { "type": "string", "description": "CPC class, e.g. \"A01B\"" },
                        "subclass": { "type": "string", "description": "Optional CPC subclass, e.g. \"00\"" },
                        "ancestors": { "type": "boolean", "description": "Include ancestors", "default": false },
                        "navigation": { "type": "boolean", "description": "Include navigation", "default": false },
                        "depth": {
                            "type": "string",
                            "description": "Traversal depth: \"0\", \"1\", \"2\", \"3\" or \"all\"",
                            "default": "1"
                        }
                    },
                    "required": ["cpc_class"]
                }
            },
            {
                "name": "convert_patent_number",
                "description": "Convert a patent number between formats.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "reference_type": { "type": "string", "description": REFERENCE_TYPE_DOC },
                        "input_format": { "type": "string", "description": "Input format: \"docdb\", \"epodoc\" or \"original\"" },
                        "number": { "type": "string", "description": "Number to convert" },
                        "output_format": { "type": "string", "description": "Output format: \"docdb\", \"epodoc\" or \"original\"" }
                    },
                    "required": ["reference_type", "input_format", "number", "output_format"]
                }
            }
        ]
    })
}

/// The `tools/list` payload, built once.
pub fn tool_definitions() -> &'static Value {
    TOOL_DEFINITIONS.get_or_init(build_tool_definitions)
}

/// Names of every tool in the catalog, in listing order.
pub fn tool_names() -> impl Iterator<Item = &'static str> {
    tool_definitions()["tools"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|tool| tool["name"].as_str())
}
