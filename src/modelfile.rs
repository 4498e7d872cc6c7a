//! Modelfile templating and model registration.
//!
//! The setup tool binds a chat persona to a base model by substituting
//! `[placeholder]` fields into a Modelfile template and registering the
//! result with `ollama create`. Pure string substitution; the template
//! content itself is opaque.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{Error, Result};

/// Identity fields substituted into the Modelfile template.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    /// Name of the model to create (sanitized: lowercase, no spaces).
    pub model_name: String,
    /// Base Ollama model (e.g. `deepseek-r1:1.5b`).
    pub base_model: String,
    pub agent_type: String,
    pub agent_name: String,
    pub user_name: String,
    pub agent_relation: String,
    pub agent_attitude: String,
}

impl AgentIdentity {
    /// Normalize an operator-supplied model name the way the setup wizard
    /// expects it: lowercased, spaces replaced with underscores.
    pub fn sanitize_model_name(raw: &str) -> String {
        raw.trim().to_lowercase().replace(' ', "_")
    }

    /// Substitute every `[placeholder]` in the template.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("[main_model_source]", &self.base_model)
            .replace("[agent_type]", &self.agent_type)
            .replace("[agent_name]", &self.agent_name)
            .replace("[user_name]", &self.user_name)
            .replace("[agent_relation]", &self.agent_relation)
            .replace("[agent_attitude]", &self.agent_attitude)
    }
}

/// Render the template file and write the generated Modelfile.
pub fn write_modelfile(
    identity: &AgentIdentity,
    template_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let template = std::fs::read_to_string(template_path)
        .map_err(|_| Error::NotFound(template_path.display().to_string()))?;
    std::fs::write(output_path, identity.render(&template))?;
    info!("Wrote Modelfile to {}", output_path.display());
    Ok(())
}

/// Register the generated Modelfile with the local runtime via
/// `ollama create <name> -f <modelfile>`.
pub fn create_model(model_name: &str, modelfile_path: &Path) -> Result<()> {
    info!("Creating model '{}' with ollama", model_name);

    let status = Command::new("ollama")
        .arg("create")
        .arg(model_name)
        .arg("-f")
        .arg(modelfile_path)
        .status()
        .map_err(|e| Error::ModelCreation(format!("failed to run ollama: {e}")))?;

    if !status.success() {
        return Err(Error::ModelCreation(format!(
            "ollama create exited with {status}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> AgentIdentity {
        AgentIdentity {
            model_name: "rpp_guru".to_string(),
            base_model: "deepseek-r1:1.5b".to_string(),
            agent_type: "guru".to_string(),
            agent_name: "Raka".to_string(),
            user_name: "Sinta".to_string(),
            agent_relation: "Pembimbing RPP".to_string(),
            agent_attitude: "Ramah dan profesional".to_string(),
        }
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let template = "FROM [main_model_source]\n\
            SYSTEM Kamu adalah [agent_type] bernama [agent_name], \
            [agent_relation] untuk [user_name]. Sikap: [agent_attitude].";

        let rendered = identity().render(template);

        assert!(rendered.contains("FROM deepseek-r1:1.5b"));
        assert!(rendered.contains("guru bernama Raka"));
        assert!(rendered.contains("Pembimbing RPP untuk Sinta"));
        assert!(rendered.contains("Ramah dan profesional"));
        assert!(!rendered.contains('['));
    }

    #[test]
    fn sanitize_model_name_normalizes() {
        assert_eq!(
            AgentIdentity::sanitize_model_name("  RPP Guru Baru "),
            "rpp_guru_baru"
        );
        assert_eq!(AgentIdentity::sanitize_model_name("rpp"), "rpp");
    }

    #[test]
    fn write_modelfile_renders_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("Modelfile-template");
        let output_path = dir.path().join("Modelfile-generated");

        std::fs::write(&template_path, "FROM [main_model_source]\n").unwrap();
        write_modelfile(&identity(), &template_path, &output_path).unwrap();

        let generated = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(generated, "FROM deepseek-r1:1.5b\n");
    }

    #[test]
    fn write_modelfile_missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_modelfile(
            &identity(),
            &dir.path().join("missing-template"),
            &dir.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
