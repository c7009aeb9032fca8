use serde_json::json;

use crate::cli::Credentials;
use crate::support::Ctx;

pub fn plans(ctx: &Ctx) {
    let plans = ctx.club.plans();
    ctx.emit("catalog.plans", json!({ "plans": plans }), || {
        let mut out = String::from("gym plans");
        for plan in &plans {
            out.push_str(&format!(
                "\n  {}: {} RON / {} days",
                plan.id, plan.price, plan.duration_days
            ));
            for benefit in plan.benefits {
                out.push_str(&format!("\n    - {benefit}"));
            }
        }
        out
    });
}

pub fn facilities(ctx: &Ctx) {
    let action = "catalog.facilities";
    let facilities = ctx.or_exit(action, ctx.club.list_facilities());
    ctx.emit(action, json!({ "facilities": facilities }), || {
        let mut out = String::from("gym facilities");
        for facility in &facilities {
            out.push_str(&format!(
                "\n  {} {} ({}), {} class(es)",
                facility.key, facility.name, facility.address, facility.class_count
            ));
            for zone in &facility.zones {
                out.push_str(&format!(
                    "\n    {:<13} {}  {}/{} ({:.1}%)",
                    zone.key, zone.schedule, zone.occupancy, zone.capacity, zone.occupancy_rate
                ));
            }
        }
        out
    });
}

pub fn stats(ctx: &Ctx, auth: Credentials) {
    let action = "catalog.stats";
    let session = ctx.login_or_exit(action, &auth);
    let stats = ctx.or_exit(action, ctx.club.admin_statistics(&session));
    ctx.emit(action, json!({ "statistics": stats }), || {
        let mut out = format!(
            "gym stats\n  Members: {} active / {} total ({:.1}%)\n  Classes: {} ({} participant(s))",
            stats.active_members,
            stats.total_members,
            stats.activation_rate,
            stats.total_classes,
            stats.total_participants
        );
        for zone in &stats.zones {
            out.push_str(&format!(
                "\n  {} {:<13} {}/{} ({:.1}%)",
                zone.facility, zone.zone, zone.occupancy, zone.capacity, zone.occupancy_rate
            ));
        }
        out
    });
    ctx.club.logout(session);
}
