// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pr = { "pr", ExportType::Pr },
    sandbox = { "sandbox", ExportType::Sandbox },
    docker = { "docker", ExportType::Docker },
    report = { "report", ExportType::Report },
)]
fn export_type_round_trips(tag: &str, ty: ExportType) {
    assert_eq!(ExportType::parse(tag), Some(ty));
    assert_eq!(ty.to_string(), tag);
}

#[test]
fn unknown_export_type_is_rejected() {
    assert_eq!(ExportType::parse("email"), None);
}

#[yare::parameterized(
    maven_long = { "jvm-maven", CliEcosystem::JvmMaven },
    maven_short = { "maven", CliEcosystem::JvmMaven },
    gradle = { "gradle", CliEcosystem::JvmGradle },
    go = { "go", CliEcosystem::Go },
)]
fn ecosystem_aliases(tag: &str, eco: CliEcosystem) {
    assert_eq!(CliEcosystem::parse(tag), Some(eco));
}

#[test]
fn ecosystem_build_commands() {
    assert_eq!(CliEcosystem::JvmMaven.build_command(), "mvn test");
    assert_eq!(CliEcosystem::Go.build_command(), "go test -v");
}
