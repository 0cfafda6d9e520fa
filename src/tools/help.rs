/// URI under which the usage guide is published as an MCP resource.
pub const HELP_URI: &str = "mcp://ops-api-help";
pub const HELP_NAME: &str = "ops-api-help";
pub const HELP_MIME_TYPE: &str = "text/markdown";

/// Usage guide for the OPS tools.
pub const HELP_TEXT: &str = r#"# Using the EPO OPS tools

## 1. Authentication
Authenticate before calling any other tool.

**Option 1: credentials from the environment (recommended)**
```
authenticate_ops_env()
```
Reads OPS_ID and OPS_SECRET (a .env file in the working directory is loaded at start-up).

**Option 2: explicit credentials**
```
authenticate_ops(consumer_key="your_key", consumer_secret="your_secret")
```

## 2. Searching
```
search_patents(query="ti=artificial intelligence", constituent="biblio", range_param="1-10")
```

Common search fields:
- `ti=word`: title
- `ab=word`: abstract
- `pa=company`: applicant
- `in=inventor`: inventor
- `ic=A01B`: classification
- `pd=20200101->20201231`: publication date

Do not put quotes around values: `in=John Doe`, not `in="John Doe"`.

## 3. Retrieving patent data
- `get_patent_biblio()`: bibliographic data
- `get_patent_abstract()`: abstract
- `get_patent_claims()`: claims
- `get_patent_description()`: full description
- `get_patent_equivalents()`: simple family
- `get_patent_family()`: INPADOC family, optionally with bibliographic data
- `get_legal_data()`: legal status events
- `search_register_data()`: European Patent Register search
- `get_cpc_classification()`: CPC scheme lookup
- `convert_patent_number()`: number format conversion

## 4. Reference formats
- **docdb**: EP.1234567.A1
- **epodoc**: EP1234567

## 5. Reference types
- **publication**: published patent
- **application**: patent application
- **priority**: priority claim

## 6. Full example
1. `authenticate_ops_env()`
2. `search_patents("ti=solar panel", "biblio", "1-5")`
3. `get_patent_biblio("publication", "epodoc", "EP1234567")`
4. `get_patent_family("publication", "epodoc", "EP1234567", true)`

## 7. Result shape
XML responses are returned as nested objects: attributes under `@attributes`,
mixed text under `#text`, repeated elements as arrays, empty elements as `null`.
A response that is not XML is returned under `raw_content`; XML that fails to
parse is returned verbatim under `raw_xml`.

## Resources
- OPS documentation: https://ops.epo.org/
- Search syntax: https://ops.epo.org/search-syntax/
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::tool_names;

    #[test]
    fn test_help_mentions_every_data_tool() {
        for tool in tool_names() {
            assert!(HELP_TEXT.contains(tool), "help text does not mention {tool}");
        }
    }
}
