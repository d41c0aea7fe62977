// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Profiles command - inspect connection profiles
//!
//! Lists names and kinds only; secret values never reach the terminal.

use colored::Colorize;
use miette::Result;

use super::ProfilesAction;
use crate::profiles::{resolve_secret, Profile, ProfileStore};

/// Run the profiles command
pub async fn run(action: ProfilesAction, _verbose: bool) -> Result<()> {
    match action {
        ProfilesAction::List { profiles } => {
            let path = profiles.unwrap_or_else(ProfileStore::default_path);
            let store = ProfileStore::from_file(&path)?;

            println!("{}", "Connection Profiles".bold());
            println!("{}", "═".repeat(40));
            println!("  Location: {}", store.path().display());
            println!();

            if store.names().is_empty() {
                println!("{}", "  No profiles configured.".dimmed());
            } else {
                for name in store.names() {
                    if let Ok(profile) = store.get(name) {
                        println!("  {} ({})", name.bold(), profile.kind());
                    }
                }
            }

            Ok(())
        }

        ProfilesAction::Check { name, profiles } => {
            let path = profiles.unwrap_or_else(ProfileStore::default_path);
            let store = ProfileStore::from_file(&path)?;

            let profile = store.get(&name)?;
            println!("  {} Profile '{}' found ({})", "✓".green(), name, profile.kind());

            // Resolve secrets without printing them
            match profile {
                Profile::Warehouse(p) => {
                    resolve_secret(&name, &p.token, &p.token_env)?;
                    println!("  {} Token resolves", "✓".green());
                    println!("  {} Account: {} (user {})", "✓".green(), p.account, p.user);
                }
                Profile::QueryEngine(p) => {
                    resolve_secret(&name, &p.token, &p.token_env)?;
                    println!("  {} Token resolves", "✓".green());
                }
                Profile::ObjectStore(p) => {
                    if p.credential.is_some() || p.credential_env.is_some() {
                        resolve_secret(&name, &p.credential, &p.credential_env)?;
                        println!("  {} Credential resolves", "✓".green());
                    } else {
                        println!(
                            "  {} No credential configured - the provider's default chain applies",
                            "⚠".yellow()
                        );
                    }
                }
            }

            println!();
            println!("{}", format!("Profile '{}' is usable.", name).green().bold());

            Ok(())
        }
    }
}
