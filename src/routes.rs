use crate::{
    api::{AppAttendanceStore, attendance, hooks, leave_request, members, profile},
    auth::middleware::auth_middleware,
    config::Config,
    store::mysql::MySqlStore,
    store::{AttendanceStore, MemberStore, RequestStore},
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("per_millisecond and burst_size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let hooks_limiter = Arc::new(build_limiter(config.rate_hooks_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/hooks").service(
            web::resource("/changes")
                .wrap(hooks_limiter)
                .route(web::post().to(hooks::receive_change)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(web::resource("/me").route(web::get().to(profile::me)))
            .service(attendance_scope::<AppAttendanceStore>())
            .service(request_scope::<MySqlStore>())
            .service(member_scope::<MySqlStore>()),
    );
}

pub(crate) fn attendance_scope<S: AttendanceStore + 'static>() -> Scope {
    web::scope("/attendance")
        // /attendance
        .service(
            web::resource("")
                .route(web::get().to(attendance::get_day::<S>))
                .route(web::post().to(attendance::submit::<S>)),
        )
        // /attendance/session
        .service(web::resource("/session").route(web::post().to(attendance::session_start::<S>)))
        // /attendance/history
        .service(web::resource("/history").route(web::get().to(attendance::history::<S>)))
        // /attendance/overview
        .service(web::resource("/overview").route(web::get().to(attendance::overview::<S>)))
        // /attendance/{id}
        .service(web::resource("/{id}").route(web::put().to(attendance::override_record::<S>)))
}

pub(crate) fn request_scope<R: RequestStore + 'static>() -> Scope {
    web::scope("/{kind:leave|noc}")
        // /leave, /noc
        .service(
            web::resource("")
                .route(web::get().to(leave_request::list_requests::<R>))
                .route(web::post().to(leave_request::create_request::<R>)),
        )
        // /leave/{id}
        .service(
            web::resource("/{id}")
                .route(web::get().to(leave_request::get_request::<R>))
                .route(web::put().to(leave_request::edit_request::<R>)),
        )
        // /leave/{id}/approve
        .service(
            web::resource("/{id}/approve").route(web::put().to(leave_request::approve_request::<R>)),
        )
        // /leave/{id}/reject
        .service(
            web::resource("/{id}/reject").route(web::put().to(leave_request::reject_request::<R>)),
        )
}

pub(crate) fn member_scope<M: MemberStore + 'static>() -> Scope {
    web::scope("/members")
        // /members
        .service(web::resource("").route(web::get().to(members::list_members::<M>)))
        // /members/{id}
        .service(
            web::resource("/{id}")
                .route(web::get().to(members::get_member::<M>))
                .route(web::put().to(members::update_member::<M>)),
        )
}
