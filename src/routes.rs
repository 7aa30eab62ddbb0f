use crate::{
    api::{attendance, building, cleaner, schedule, time_off},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Milliseconds between replenished requests. The governor rejects a zero
/// interval, so both a zero rate and rates above 60k/min clamp to 1ms.
fn replenish_interval_ms(requests_per_min: u32) -> u64 {
    if requests_per_min == 0 {
        return 1;
    }
    (60_000 / requests_per_min as u64).max(1)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(replenish_interval_ms(requests_per_min))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/cleaners")
                    // /cleaners
                    .service(
                        web::resource("")
                            .route(web::post().to(cleaner::create_cleaner))
                            .route(web::get().to(cleaner::list_cleaners)),
                    )
                    // /cleaners/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(cleaner::update_cleaner))
                            .route(web::get().to(cleaner::get_cleaner))
                            .route(web::delete().to(cleaner::delete_cleaner)),
                    ),
            )
            .service(
                web::scope("/buildings")
                    // /buildings
                    .service(
                        web::resource("")
                            .route(web::post().to(building::create_building))
                            .route(web::get().to(building::list_buildings)),
                    )
                    // /buildings/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(building::update_building))
                            .route(web::get().to(building::get_building)),
                    ),
            )
            .service(
                web::scope("/schedule")
                    // /schedule
                    .service(
                        web::resource("")
                            .route(web::get().to(schedule::list_entries))
                            .route(web::post().to(schedule::create_entry)),
                    )
                    // /schedule/{id}/assign
                    .service(
                        web::resource("/{id}/assign")
                            .route(web::put().to(schedule::assign_cleaner)),
                    ),
            )
            .service(
                web::scope("/time-off")
                    // /time-off/availability (before /{id} so the literal wins)
                    .service(
                        web::resource("/availability")
                            .route(web::get().to(time_off::check_availability)),
                    )
                    // /time-off
                    .service(
                        web::resource("")
                            .route(web::get().to(time_off::time_off_list))
                            .route(web::post().to(time_off::create_time_off)),
                    )
                    // /time-off/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(time_off::get_time_off)),
                    )
                    // /time-off/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(time_off::approve_time_off)),
                    )
                    // /time-off/{id}/decline
                    .service(
                        web::resource("/{id}/decline")
                            .route(web::put().to(time_off::decline_time_off)),
                    )
                    // /time-off/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(time_off::cancel_time_off)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/clock-in").route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out").route(web::post().to(attendance::clock_out)),
                    )
                    .service(
                        web::resource("/active").route(web::get().to(attendance::active_record)),
                    )
                    .service(
                        web::resource("/window")
                            .route(web::get().to(attendance::clock_in_window)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::replenish_interval_ms;

    #[test]
    fn replenish_interval_is_never_zero() {
        assert_eq!(replenish_interval_ms(60), 1000);
        assert_eq!(replenish_interval_ms(1000), 60);
        // degenerate rates must not produce the interval the governor rejects
        assert_eq!(replenish_interval_ms(0), 1);
        assert_eq!(replenish_interval_ms(120_000), 1);
    }
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
