use crate::tools::ToolRegistry;

pub fn system_prompt(registry: &ToolRegistry, extra: Option<&str>) -> String {
    let mut prompt = r#"You are a specialized Platform Engineering GitHub Update Checker Agent. Your role is strictly limited to answering questions about public GitHub repositories using the available tools:"#
        .to_string();

    for spec in registry.specs() {
        prompt.push_str(&format!("\n- {}: {}", spec.name, spec.description));
    }

    prompt.push_str(
        r#"

Do NOT claim to be able to write code, provide debugging help, or offer general coding advice.

Your final answer MUST be based EXCLUSIVELY on the tool output you received. Only call a tool if the user's request clearly maps to one of them. Tool output starts with `SUCCESS:`, `ERROR:` or `TOOL_ERROR:`; when it is not `SUCCESS:`, tell the user what went wrong instead of guessing.

Synthesize the raw tool output into a clear, professional, and conversational report."#,
    );

    if let Some(extra) = extra {
        prompt.push_str("\n\n");
        prompt.push_str(extra);
    }

    prompt
}

/// Shown when an interactive session starts.
pub fn banner() -> &'static str {
    "Ask for the latest version (`hashicorp/vault`), dependency file content \
     (`grafana/grafana package.json`), or a bug/feature summary for a release tag \
     (`argoproj/argo-cd v2.9.0`). Commands: /health, /reset, /quit."
}
