// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-build worker: per-ecosystem reproduction project trees.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use retrace_core::{CliEcosystem, ReproId};
use retrace_runtime::{Bus, Handler, WorkerContext, WorkerError};
use retrace_storage::repros;
use retrace_wire::{decode, encode, CliCompleted, CliRequest, Subject};

/// Stable CLI-repro id per source repro: a redelivered `cli.request`
/// converges on the same row instead of inserting a duplicate.
pub fn cli_repro_id_for(repro_id: &ReproId) -> String {
    format!("{}-cli", repro_id)
}

/// Detect the build ecosystem from the files present in a repo checkout.
pub fn detect_ecosystem(repo_path: &Path) -> Option<CliEcosystem> {
    if repo_path.join("pom.xml").is_file() {
        Some(CliEcosystem::JvmMaven)
    } else if repo_path.join("build.gradle").is_file() {
        Some(CliEcosystem::JvmGradle)
    } else if repo_path.join("go.mod").is_file() {
        Some(CliEcosystem::Go)
    } else {
        None
    }
}

/// One generated file in the reproduction tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub path: String,
    pub content: String,
}

/// The generated reproduction tree for one ecosystem.
#[derive(Debug, Clone)]
pub struct ReproductionTree {
    pub ecosystem: CliEcosystem,
    pub test_file: String,
    pub build_command: &'static str,
    pub files: Vec<TreeFile>,
}

impl ReproductionTree {
    pub fn file(&self, path: &str) -> Option<&TreeFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Build the project tree: build file, test source at the conventional path,
/// Dockerfile and compose recipe.
pub fn build_tree(ecosystem: CliEcosystem, repro_id: &ReproId, test_code: &str) -> ReproductionTree {
    let mut files = Vec::new();
    let test_file = match ecosystem {
        CliEcosystem::JvmMaven => {
            files.push(TreeFile { path: "pom.xml".into(), content: maven_pom() });
            files.push(TreeFile { path: "Dockerfile".into(), content: jvm_dockerfile("maven") });
            let path = format!("src/test/java/com/bugrepro/Reproduction{}.java", java_safe(repro_id));
            files.push(TreeFile { path: path.clone(), content: test_code.to_string() });
            path
        }
        CliEcosystem::JvmGradle => {
            files.push(TreeFile { path: "build.gradle".into(), content: gradle_build() });
            files.push(TreeFile { path: "Dockerfile".into(), content: jvm_dockerfile("gradle") });
            let path = format!("src/test/java/com/bugrepro/Reproduction{}.java", java_safe(repro_id));
            files.push(TreeFile { path: path.clone(), content: test_code.to_string() });
            path
        }
        CliEcosystem::Go => {
            files.push(TreeFile { path: "go.mod".into(), content: go_mod() });
            files.push(TreeFile { path: "Dockerfile".into(), content: go_dockerfile() });
            let path = format!("reproduction_{}_test.go", go_safe(repro_id));
            files.push(TreeFile { path: path.clone(), content: test_code.to_string() });
            path
        }
    };
    files.push(TreeFile {
        path: "docker-compose.yml".into(),
        content: compose_recipe(ecosystem, repro_id),
    });

    ReproductionTree { ecosystem, test_file, build_command: ecosystem.build_command(), files }
}

fn java_safe(repro_id: &ReproId) -> String {
    repro_id.as_str().chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn go_safe(repro_id: &ReproId) -> String {
    repro_id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn maven_pom() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0
         http://maven.apache.org/xsd/maven-4.0.0.xsd">
    <modelVersion>4.0.0</modelVersion>

    <groupId>com.bugrepro</groupId>
    <artifactId>bug-reproduction</artifactId>
    <version>1.0.0</version>

    <properties>
        <maven.compiler.source>11</maven.compiler.source>
        <maven.compiler.target>11</maven.compiler.target>
        <project.build.sourceEncoding>UTF-8</project.build.sourceEncoding>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.junit.jupiter</groupId>
            <artifactId>junit-jupiter</artifactId>
            <version>5.9.2</version>
            <scope>test</scope>
        </dependency>
        <dependency>
            <groupId>org.seleniumhq.selenium</groupId>
            <artifactId>selenium-java</artifactId>
            <version>4.8.1</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>
"#
    .to_string()
}

fn gradle_build() -> String {
    r#"plugins {
    id 'java'
}

group = 'com.bugrepro'
version = '1.0.0'

repositories {
    mavenCentral()
}

dependencies {
    testImplementation 'org.junit.jupiter:junit-jupiter:5.9.2'
    testImplementation 'org.seleniumhq.selenium:selenium-java:4.8.1'
}

test {
    useJUnitPlatform()
}

java {
    sourceCompatibility = JavaVersion.VERSION_11
    targetCompatibility = JavaVersion.VERSION_11
}
"#
    .to_string()
}

fn go_mod() -> String {
    r#"module bug-reproduction

go 1.21

require (
    github.com/stretchr/testify v1.8.4
    github.com/tebeka/selenium v0.9.9
)
"#
    .to_string()
}

fn jvm_dockerfile(build_tool: &str) -> String {
    let (install, run) = match build_tool {
        "maven" => ("maven", "CMD [\"mvn\", \"test\"]"),
        _ => ("gradle", "CMD [\"gradle\", \"test\"]"),
    };
    format!(
        "FROM openjdk:11-jdk-slim\n\nWORKDIR /app\n\nRUN apt-get update && apt-get install -y {}\n\nCOPY . .\n\n{}\n",
        install, run
    )
}

fn go_dockerfile() -> String {
    "FROM golang:1.21-alpine\n\nWORKDIR /app\n\nCOPY go.mod ./\nRUN go mod download\n\nCOPY . .\n\nCMD [\"go\", \"test\", \"-v\"]\n".to_string()
}

fn compose_recipe(ecosystem: CliEcosystem, repro_id: &ReproId) -> String {
    match ecosystem {
        CliEcosystem::Go => format!(
            "services:\n  go-repro-{id}:\n    build: .\n    environment:\n      - CGO_ENABLED=0\n    volumes:\n      - ./test-results:/app/test-results\n",
            id = go_safe(repro_id)
        ),
        _ => format!(
            "services:\n  jvm-repro-{id}:\n    build: .\n    environment:\n      - JAVA_OPTS=-Xmx2g\n    volumes:\n      - ./test-results:/app/test-results\n    depends_on:\n      - selenium-hub\n\n  selenium-hub:\n    image: selenium/hub:4.8.1\n    ports:\n      - \"4444:4444\"\n\n  chrome:\n    image: selenium/node-chrome:4.8.1\n    depends_on:\n      - selenium-hub\n    shm_size: 2gb\n",
            id = java_safe(repro_id)
        ),
    }
}

pub struct CliBuildHandler {
    ctx: Arc<WorkerContext>,
    bus: Arc<dyn Bus>,
}

impl CliBuildHandler {
    pub fn new(ctx: Arc<WorkerContext>, bus: Arc<dyn Bus>) -> Self {
        Self { ctx, bus }
    }
}

#[async_trait]
impl Handler for CliBuildHandler {
    fn role(&self) -> &'static str {
        "cli"
    }

    fn subject(&self) -> Subject {
        Subject::CliRequest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: CliRequest = decode(payload)?;

        let ecosystem = if request.ecosystem == "auto" {
            let repo_path = request.repo_path.as_deref().unwrap_or("");
            detect_ecosystem(Path::new(repo_path)).ok_or_else(|| {
                WorkerError::MalformedInput(format!(
                    "cannot detect ecosystem under {:?}",
                    repo_path
                ))
            })?
        } else {
            CliEcosystem::parse(&request.ecosystem).ok_or_else(|| {
                WorkerError::MalformedInput(format!(
                    "unsupported ecosystem: {}",
                    request.ecosystem
                ))
            })?
        };

        let tree = build_tree(ecosystem, &request.repro_id, &request.test_code);

        // Write the tree out; the scope keeps it only as long as the handler.
        let scope = self.ctx.temp_scope("cli")?;
        for file in &tree.files {
            let path = scope.path().join(&file.path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| WorkerError::Internal(err.to_string()))?;
            }
            tokio::fs::write(&path, &file.content)
                .await
                .map_err(|err| WorkerError::Internal(err.to_string()))?;
        }

        let cli_repro_id = cli_repro_id_for(&request.repro_id);
        repros::insert_cli_repro(
            &self.ctx.db,
            &cli_repro_id,
            &request.repro_id,
            ecosystem,
            &tree.test_file,
            tree.build_command,
            "Dockerfile",
            "docker-compose.yml",
        )
        .await?;

        let result = serde_json::json!({
            "type": ecosystem.to_string(),
            "test_file": tree.test_file,
            "build_command": tree.build_command,
            "files": tree.files.iter().map(|f| serde_json::json!({
                "path": f.path,
                "content": f.content,
            })).collect::<Vec<_>>(),
        });
        let completed = CliCompleted {
            cli_repro_id: cli_repro_id.clone(),
            repro_id: request.repro_id.clone(),
            ecosystem: ecosystem.to_string(),
            result,
        };
        self.bus
            .publish(Subject::CliCompleted.as_str(), encode(&completed)?)
            .await?;

        info!(
            repro_id = %request.repro_id,
            cli_repro_id,
            ecosystem = %ecosystem,
            files = tree.files.len(),
            "cli reproduction built"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
