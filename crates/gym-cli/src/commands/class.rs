use gym_kernel::NewClass;
use gym_service::ClassView;
use serde_json::json;

use crate::cli::Credentials;
use crate::support::Ctx;

pub fn list(ctx: &Ctx) {
    let action = "class.list";
    let classes = ctx.or_exit(action, ctx.club.list_classes());
    ctx.emit(
        action,
        json!({ "count": classes.len(), "classes": classes }),
        || render("gym classes", &classes),
    );
}

pub fn add(ctx: &Ctx, auth: Credentials, facility: String, new_class: NewClass) {
    let action = "class.add";
    let session = ctx.login_or_exit(action, &auth);
    let scheduled = ctx.or_exit(action, ctx.club.add_class(&session, &facility, new_class));
    ctx.emit(action, json!({ "class": scheduled }), || {
        format!("gym add-class\n  {scheduled}")
    });
    ctx.club.logout(session);
}

pub fn remove(ctx: &Ctx, auth: Credentials, facility: String, class_id: String) {
    let action = "class.remove";
    let session = ctx.login_or_exit(action, &auth);
    let removed = ctx.or_exit(action, ctx.club.remove_class(&session, &facility, &class_id));
    ctx.emit(action, json!({ "removed": removed }), || {
        format!("gym remove-class\n  {removed}")
    });
    ctx.club.logout(session);
}

pub fn reserve(ctx: &Ctx, auth: Credentials, facility: String, class_id: String) {
    let action = "class.reserve";
    let session = ctx.login_or_exit(action, &auth);
    let receipt = ctx.or_exit(action, ctx.club.reserve_class(&session, &facility, &class_id));
    ctx.emit(action, json!({ "reservation": receipt }), || {
        format!("gym reserve\n  {receipt}")
    });
    ctx.club.logout(session);
}

pub fn cancel_reservation(ctx: &Ctx, auth: Credentials, facility: String, class_id: String) {
    let action = "class.cancel_reservation";
    let session = ctx.login_or_exit(action, &auth);
    ctx.or_exit(
        action,
        ctx.club
            .cancel_reservation(&session, &facility, &class_id),
    );
    ctx.emit(
        action,
        json!({ "classId": class_id, "facility": facility }),
        || format!("gym cancel-reservation\n  Cancelled: {class_id} at {facility}"),
    );
    ctx.club.logout(session);
}

pub fn reservations(ctx: &Ctx, auth: Credentials) {
    let action = "class.reservations";
    let session = ctx.login_or_exit(action, &auth);
    let classes = ctx.or_exit(action, ctx.club.list_my_reservations(&session));
    ctx.emit(
        action,
        json!({ "count": classes.len(), "classes": classes }),
        || render("gym reservations", &classes),
    );
    ctx.club.logout(session);
}

fn render(title: &str, classes: &[ClassView]) -> String {
    let mut out = format!("{title}\n  Count: {}", classes.len());
    for class in classes {
        out.push_str(&format!("\n  {class}"));
    }
    out
}
