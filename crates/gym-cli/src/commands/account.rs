use serde_json::json;

use crate::cli::Credentials;
use crate::support::Ctx;

pub fn register_member(ctx: &Ctx, id: String, secret: String, name: String) {
    let action = "account.register_member";
    ctx.or_exit(action, ctx.club.register_member(&id, &secret, &name));
    ctx.emit(action, json!({ "id": id, "kind": "member" }), || {
        format!("gym register-member\n  Registered: {id} ({name})")
    });
}

pub fn register_operator(ctx: &Ctx, id: String, secret: String, name: String, access_level: String) {
    let action = "account.register_operator";
    ctx.or_exit(
        action,
        ctx.club
            .register_operator(&id, &secret, &name, &access_level),
    );
    ctx.emit(
        action,
        json!({ "id": id, "kind": "operator", "accessLevel": access_level }),
        || format!("gym register-operator\n  Registered: {id} ({name}, {access_level})"),
    );
}

pub fn whoami(ctx: &Ctx, auth: Credentials) {
    let action = "account.whoami";
    let session = ctx.login_or_exit(action, &auth);
    let info = ctx
        .or_exit(action, ctx.club.current_user_info(&session))
        .unwrap_or_default();
    ctx.emit(action, json!({ "account": info }), || {
        let mut out = String::from("gym whoami");
        for (key, value) in &info {
            out.push_str(&format!("\n  {key}: {value}"));
        }
        out
    });
    ctx.club.logout(session);
}

pub fn change_secret(ctx: &Ctx, auth: Credentials, new_secret: String) {
    let action = "account.change_secret";
    let session = ctx.login_or_exit(action, &auth);
    ctx.or_exit(
        action,
        ctx.club
            .change_credential(&session, &auth.secret, &new_secret),
    );
    ctx.emit(action, json!({ "id": session.account_id() }), || {
        format!("gym change-secret\n  Updated: {}", session.account_id())
    });
    ctx.club.logout(session);
}
