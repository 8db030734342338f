use crate::{
    api::{
        asset, attendance, employee, grievance, holiday, invoice, learning, leave, notification,
        payroll, referral,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
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
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee)),
                    )
                    .service(
                        web::resource("/{id}/deactivate")
                            .route(web::put().to(employee::deactivate_employee)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    )
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(leave::withdraw_leave)),
                    )
                    .service(
                        web::resource("/{id}/correct").route(web::put().to(leave::correct_leave)),
                    ),
            )
            .service(
                web::scope("/attendance").service(
                    web::resource("/{id}").route(web::get().to(attendance::month_attendance)),
                ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::list_statements)))
                    .service(web::resource("/run").route(web::post().to(payroll::run_payroll)))
                    // /payroll/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(payroll::preview_statement)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::post().to(holiday::create_holiday))
                            .route(web::get().to(holiday::list_holidays)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/invoices")
                    .service(
                        web::resource("")
                            .route(web::post().to(invoice::create_invoice))
                            .route(web::get().to(invoice::list_invoices)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(invoice::get_invoice))
                            .route(web::put().to(invoice::update_invoice)),
                    )
                    .service(
                        web::resource("/{id}/logs").route(web::get().to(invoice::invoice_logs)),
                    ),
            )
            .service(
                web::scope("/assets")
                    // fixed path before the {id} matcher
                    .service(
                        web::resource("/assignments")
                            .route(web::get().to(asset::list_assignments)),
                    )
                    .service(
                        web::resource("")
                            .route(web::post().to(asset::create_asset))
                            .route(web::get().to(asset::list_assets)),
                    )
                    .service(
                        web::resource("/{id}/assign").route(web::post().to(asset::assign_asset)),
                    )
                    .service(
                        web::resource("/{id}/return").route(web::put().to(asset::return_asset)),
                    ),
            )
            .service(
                web::scope("/referrals")
                    .service(
                        web::resource("")
                            .route(web::post().to(referral::submit_referral))
                            .route(web::get().to(referral::list_referrals)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(referral::update_referral_status)),
                    ),
            )
            .service(
                web::scope("/learning")
                    .service(
                        web::resource("/courses")
                            .route(web::post().to(learning::create_course))
                            .route(web::get().to(learning::list_courses)),
                    )
                    .service(
                        web::resource("/assign").route(web::post().to(learning::assign_course)),
                    )
                    .service(web::resource("/mine").route(web::get().to(learning::my_enrollments)))
                    .service(
                        web::resource("/enrollments/{id}/progress")
                            .route(web::put().to(learning::update_progress)),
                    ),
            )
            .service(
                web::scope("/grievances")
                    .service(
                        web::resource("")
                            .route(web::post().to(grievance::file_grievance))
                            .route(web::get().to(grievance::list_grievances)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(grievance::transition_grievance)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notification::my_notifications)),
                    )
                    .service(
                        web::resource("/read-all")
                            .route(web::put().to(notification::mark_all_read)),
                    )
                    .service(
                        web::resource("/{id}/read").route(web::put().to(notification::mark_read)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
