use super::harness::TestHarness;

/// Builds the YAML for `registry/modules.yaml` and `registry/urns.yaml`.
#[derive(Default)]
pub struct RegistryBuilder {
    modules: Vec<(String, Vec<String>)>,
    urns: Vec<(String, String)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, name: &str, dependencies: &[&str]) -> Self {
        self.modules.push((
            name.to_string(),
            dependencies.iter().map(|d| d.to_string()).collect(),
        ));
        self
    }

    pub fn urn(mut self, urn: &str, module: &str) -> Self {
        self.urns.push((urn.to_string(), module.to_string()));
        self
    }

    pub fn modules_yaml(&self) -> String {
        let mut yaml = String::from("modules:\n");
        for (name, dependencies) in &self.modules {
            yaml.push_str(&format!("  - name: {}\n", name));
            if !dependencies.is_empty() {
                yaml.push_str(&format!("    dependencies: [{}]\n", dependencies.join(", ")));
            }
        }
        yaml
    }

    pub fn urns_yaml(&self) -> String {
        let mut yaml = String::from("urns:\n");
        for (urn, module) in &self.urns {
            yaml.push_str(&format!("  - urn: {}\n    module: {}\n", urn, module));
        }
        yaml
    }

    pub fn write_to(&self, harness: &TestHarness) {
        harness.write("registry/modules.yaml", &self.modules_yaml());
        harness.write("registry/urns.yaml", &self.urns_yaml());
    }
}

/// Builds `.govgate/rules.yaml` from raw rule blocks.
#[derive(Default)]
pub struct RulesBuilder {
    rules: Vec<String>,
}

impl RulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule given as `key: value` lines (without indentation).
    pub fn rule(mut self, id: &str, family: &str, fields: &[&str]) -> Self {
        let mut block = format!("  - id: {}\n    family: {}\n", id, family);
        for field in fields {
            block.push_str(&format!("    {}\n", field));
        }
        self.rules.push(block);
        self
    }

    pub fn yaml(&self) -> String {
        format!("rules:\n{}", self.rules.concat())
    }

    pub fn write_to(&self, harness: &TestHarness) {
        harness.write(".govgate/rules.yaml", &self.yaml());
    }
}

/// Write a `.govgate/config.md` with the given YAML frontmatter.
pub fn write_config(harness: &TestHarness, frontmatter: &str) {
    harness.write(
        ".govgate/config.md",
        &format!("---\n{}---\n\n# Governance config\n", frontmatter),
    );
}
