use gym_kernel::VisitOutcome;
use serde_json::json;

use crate::cli::Credentials;
use crate::support::Ctx;

pub fn activate(ctx: &Ctx, auth: Credentials, plan: String) {
    let action = "membership.activate";
    let session = ctx.login_or_exit(action, &auth);
    let activation = ctx.or_exit(action, ctx.club.activate_membership(&session, &plan));
    ctx.emit(
        action,
        json!({
            "plan": activation.plan,
            "expiresAt": activation.expires_at,
        }),
        || format!("gym activate\n  {activation}"),
    );
    ctx.club.logout(session);
}

pub fn cancel(ctx: &Ctx, auth: Credentials) {
    let action = "membership.cancel";
    let session = ctx.login_or_exit(action, &auth);
    let at = ctx.or_exit(action, ctx.club.cancel_membership(&session));
    ctx.emit(action, json!({ "cancelledAt": at }), || {
        format!(
            "gym cancel-membership\n  Cancelled at {}",
            at.format("%Y-%m-%d %H:%M:%S")
        )
    });
    ctx.club.logout(session);
}

pub fn visit(ctx: &Ctx, auth: Credentials) {
    let action = "membership.visit";
    let session = ctx.login_or_exit(action, &auth);
    let outcome = ctx.or_exit(action, ctx.club.record_visit(&session));
    let payload = match outcome {
        VisitOutcome::Recorded(at) => json!({ "outcome": "recorded", "at": at }),
        VisitOutcome::Expired(expiry) => json!({ "outcome": "expired", "expiry": expiry }),
    };
    ctx.emit(action, payload, || format!("gym visit\n  {outcome}"));
    ctx.club.logout(session);
}
