//! The tool catalog: named operations an agent can call, each turned into an
//! OPS request (or an authentication) and answered with a JSON envelope.

mod args;
pub mod catalog;
pub mod help;

use serde_json::{json, Value};

use crate::error::{error_envelope, OpsError};
use crate::session::OpsSession;

pub use args::{FetchPlan, PublishedConstituent, SearchService};
use args::{
    parse_args, AuthenticateArgs, ConvertArgs, CpcArgs, FamilyArgs, ReferenceArgs, SearchArgs,
};

/// A parsed tool invocation.
#[derive(Debug)]
pub enum ToolCall {
    AuthenticateFromEnv,
    Authenticate {
        consumer_key: String,
        consumer_secret: String,
    },
    Fetch(FetchPlan),
}

impl ToolCall {
    /// Resolve a tool name and its JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::UnknownTool`] for names outside the catalog and
    /// [`OpsError::InvalidParams`] for missing or mistyped arguments.
    pub fn parse(name: &str, arguments: Value) -> Result<Self, OpsError> {
        let call = match name {
            "authenticate_ops_env" => ToolCall::AuthenticateFromEnv,
            "authenticate_ops" => {
                let args: AuthenticateArgs = parse_args(name, arguments)?;
                ToolCall::Authenticate {
                    consumer_key: args.consumer_key,
                    consumer_secret: args.consumer_secret,
                }
            }
            "search_patents" => {
                let args: SearchArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.plan(name, SearchService::PublishedData)?)
            }
            "search_register_data" => {
                let args: SearchArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.plan(name, SearchService::Register)?)
            }
            "get_patent_biblio" => published(name, arguments, PublishedConstituent::Biblio)?,
            "get_patent_abstract" => published(name, arguments, PublishedConstituent::Abstract)?,
            "get_patent_claims" => published(name, arguments, PublishedConstituent::Claims)?,
            "get_patent_description" => {
                published(name, arguments, PublishedConstituent::Description)?
            }
            "get_patent_equivalents" => {
                published(name, arguments, PublishedConstituent::Equivalents)?
            }
            "get_patent_family" => {
                let args: FamilyArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.plan(name)?)
            }
            "get_legal_data" => {
                let args: ReferenceArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.legal_plan(name)?)
            }
            "get_cpc_classification" => {
                let args: CpcArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.plan(name)?)
            }
            "convert_patent_number" => {
                let args: ConvertArgs = parse_args(name, arguments)?;
                ToolCall::Fetch(args.plan(name)?)
            }
            other => return Err(OpsError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }

    /// Whether a catalog tool reads through the session's authenticated client.
    #[must_use]
    pub fn requires_session(name: &str) -> bool {
        !matches!(name, "authenticate_ops_env" | "authenticate_ops")
            && catalog::tool_names().any(|tool| tool == name)
    }
}

fn published(
    name: &str,
    arguments: Value,
    constituent: PublishedConstituent,
) -> Result<ToolCall, OpsError> {
    let args: ReferenceArgs = parse_args(name, arguments)?;
    Ok(ToolCall::Fetch(args.published_plan(name, constituent)?))
}

/// Run a tool and return its envelope. Never fails: every error becomes
/// `{"error": message}`.
pub async fn call_tool(session: &OpsSession, name: &str, arguments: Value) -> Value {
    match run_tool(session, name, arguments).await {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(tool = name, error = %err, "tool call failed");
            error_envelope(&err)
        }
    }
}

async fn run_tool(session: &OpsSession, name: &str, arguments: Value) -> Result<Value, OpsError> {
    if ToolCall::requires_session(name) && !session.is_authenticated() {
        return Err(OpsError::NotAuthenticated);
    }
    match ToolCall::parse(name, arguments)? {
        ToolCall::AuthenticateFromEnv => {
            session.authenticate_from_env().await?;
            let credentials = &session.config().credentials;
            Ok(json!({
                "status": "authenticated",
                "message": format!(
                    "Authentication succeeded using {} and {} from the environment; access token configured.",
                    credentials.key_env, credentials.secret_env
                ),
            }))
        }
        ToolCall::Authenticate {
            consumer_key,
            consumer_secret,
        } => {
            session.authenticate(&consumer_key, &consumer_secret).await?;
            Ok(json!({
                "status": "authenticated",
                "message": "Authentication succeeded; access token configured.",
            }))
        }
        ToolCall::Fetch(plan) => {
            let decoded = session.fetch(&plan.request).await?;
            let mut envelope = plan.echo;
            envelope.insert(plan.result_key.to_string(), decoded.to_document_json());
            Ok(Value::Object(envelope))
        }
    }
}
