use serde_json::json;

use crate::cli::Credentials;
use crate::support::Ctx;

pub fn check_in(ctx: &Ctx, auth: Credentials, facility: String, zone: String) {
    let action = "zone.check_in";
    let session = ctx.login_or_exit(action, &auth);
    let receipt = ctx.or_exit(action, ctx.club.check_in(&session, &facility, &zone));
    ctx.emit(action, json!({ "checkIn": receipt }), || {
        format!("gym check-in\n  {receipt}")
    });
    ctx.club.logout(session);
}

pub fn check_out(ctx: &Ctx, auth: Credentials, facility: String) {
    let action = "zone.check_out";
    let session = ctx.login_or_exit(action, &auth);
    let receipt = ctx.or_exit(action, ctx.club.check_out(&session, &facility));
    ctx.emit(action, json!({ "checkOut": receipt }), || {
        format!("gym check-out\n  {receipt}")
    });
    ctx.club.logout(session);
}
