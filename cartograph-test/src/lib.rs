// Integration test utilities and fixture management for Cartograph.

use std::path::Path;

use cartograph_core::config::AnalyzerConfig;
use cartograph_core::pipeline::{AnalysisOutcome, GraphPipeline};

/// A test fixture repository in a temporary directory.
#[derive(Debug)]
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        self
    }

    /// Package `a` declares `helper`; package `b` declares `main` which
    /// calls it.
    pub fn helper_and_main() -> Self {
        let repo = Self::empty();
        repo.write(
            "a/helper.py",
            "def helper():\n    \"\"\"Does the work.\"\"\"\n    return 1\n",
        );
        repo.write("b/main.py", "def main():\n    return helper()\n");
        repo
    }

    /// Two files each declare `run`; a third calls it with no import hint.
    pub fn duplicate_run() -> Self {
        let repo = Self::empty();
        repo.write("alpha.py", "def run():\n    pass\n");
        repo.write("beta.py", "def run():\n    pass\n");
        repo.write("caller.py", "def main():\n    run()\n");
        repo
    }

    /// Package `a` imports package `b` and vice versa.
    pub fn cyclic_packages() -> Self {
        let repo = Self::empty();
        repo.write("a/__init__.py", "");
        repo.write("a/one.py", "import b.two\n\ndef first():\n    pass\n");
        repo.write("b/__init__.py", "");
        repo.write("b/two.py", "import a.one\n\ndef second():\n    pass\n");
        repo
    }

    /// A multi-language project covering structural and heuristic paths.
    pub fn multi_lang() -> Self {
        let repo = Self::empty();
        repo.write(
            "rust-svc/Cargo.toml",
            "[package]\nname = \"rust-svc\"\nversion = \"0.1.0\"\n",
        );
        repo.write(
            "rust-svc/src/main.rs",
            "fn main() {\n    let msg = build_message();\n    println!(\"{msg}\");\n}\n\nfn build_message() -> String {\n    \"rust service\".to_string()\n}\n",
        );
        repo.write(
            "py-lib/main.py",
            "import json\n\ndef fetch_data(url: str) -> dict:\n    \"\"\"Fetch and decode.\"\"\"\n    return json.loads(url)\n\ndef process(data: dict) -> str:\n    return str(data)\n",
        );
        repo.write(
            "ts-app/src/index.ts",
            "import { greet } from './greet';\n\nfunction main(): void {\n    greet('world');\n}\n",
        );
        repo.write(
            "ts-app/src/greet.ts",
            "export function greet(name: string): string {\n    return `Hello, ${name}!`;\n}\n",
        );
        repo.write(
            "scripts/deploy.sh",
            "#!/bin/bash\ndeploy() {\n    echo deploying\n}\ndeploy\n",
        );
        repo
    }
}

/// Run the full pipeline on a repo path with default configuration.
pub fn run_pipeline(repo_path: &Path) -> cartograph_core::error::Result<AnalysisOutcome> {
    let pipeline = GraphPipeline::new(repo_path);
    pipeline.run(&AnalyzerConfig::default())
}

/// Run the pipeline and serialize the graph, returning both.
pub fn run_and_serialize(repo_path: &Path) -> (AnalysisOutcome, Vec<u8>) {
    let outcome = run_pipeline(repo_path).expect("pipeline should complete");
    let bytes = cartograph_core::serialize::to_json_bytes(&outcome.graph)
        .expect("graph should serialize");
    (outcome, bytes)
}
