//! Session command handlers: login, logout, whoami, verify, can.

use std::fmt::Write as _;

use secrecy::SecretString;
use serde::Serialize;
use shopdesk_api::{AdminClient, HealthCheck, Permission, Role};

use crate::cli::{CanArgs, GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

// ── Whoami view ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WhoAmI {
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    remember_me: bool,
    permissions: Vec<Permission>,
}

fn whoami_detail(w: &WhoAmI) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:        {}", w.name.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Email:       {}", w.email.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "Role:        {}",
        w.role.map_or_else(|| "unknown".into(), |r| r.to_string())
    );
    let _ = writeln!(
        out,
        "Persisted:   {}",
        if w.remember_me { "yes" } else { "this run only" }
    );
    let perms: Vec<String> = w.permissions.iter().map(ToString::to_string).collect();
    let _ = write!(out, "Permissions: {}", perms.join(", "));
    out
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(
    client: &AdminClient,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.wait {
        client.check_server_health(&HealthCheck::default()).await?;
    }

    let password = match args.password {
        Some(p) => SecretString::from(p),
        None => SecretString::from(rpassword::prompt_password("Password: ")?),
    };

    let session = client
        .login(&args.email, &password, !args.no_remember)
        .await?;

    if !global.quiet {
        eprintln!(
            "Signed in as {} ({})",
            session.admin.display_name(),
            session
                .admin
                .role
                .map_or_else(|| "unknown role".into(), |r| r.to_string())
        );
        if args.no_remember {
            eprintln!("Session kept for this run only");
        }
    }
    Ok(())
}

pub async fn logout(client: &AdminClient, global: &GlobalOpts) -> Result<(), CliError> {
    let was_signed_in = client.store().is_authenticated();
    client.logout().await;
    if !global.quiet {
        eprintln!(
            "{}",
            if was_signed_in {
                "Logged out"
            } else {
                "No active session"
            }
        );
    }
    Ok(())
}

pub fn whoami(client: &AdminClient, global: &GlobalOpts) -> Result<(), CliError> {
    let store = client.store();
    if !store.is_authenticated() {
        return Err(CliError::NotLoggedIn);
    }
    let admin = store.admin_info().unwrap_or_default();
    let role = admin.role;
    let view = WhoAmI {
        name: admin.full_name,
        email: admin.email,
        role,
        remember_me: store.remember_me(),
        permissions: role.map(Role::permissions).unwrap_or_default(),
    };

    let out = output::render_single(global.output, &view, whoami_detail);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn verify(client: &AdminClient, global: &GlobalOpts) -> Result<(), CliError> {
    if !client.store().is_authenticated() {
        return Err(CliError::NotLoggedIn);
    }
    if client.verify_session().await {
        if !global.quiet {
            eprintln!("Session is valid");
        }
        Ok(())
    } else {
        Err(CliError::AuthFailed {
            message: "Session could not be verified".into(),
        })
    }
}

pub fn can(client: &AdminClient, args: &CanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = client.store();
    if !store.is_authenticated() {
        return Err(CliError::NotLoggedIn);
    }

    if store.has_permission_named(&args.permission) {
        if !global.quiet {
            println!("yes");
        }
        Ok(())
    } else {
        Err(CliError::PermissionDenied {
            permission: args.permission.clone(),
            role: store
                .role()
                .map_or_else(|| "unknown".into(), |r| r.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_lists_permissions() {
        let view = WhoAmI {
            name: Some("Shop Admin".into()),
            email: Some("a@b.com".into()),
            role: Some(Role::Staff),
            remember_me: true,
            permissions: vec![Permission::ViewOrders, Permission::ProcessReturns],
        };
        let out = whoami_detail(&view);
        assert!(out.contains("Role:        staff"));
        assert!(out.contains("view_orders, process_returns"));
    }
}
