pub mod auth;
pub mod health;
pub mod todos;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::profile),
    )
    .service(
        web::scope("/todos")
            // literal segment must register before the /{id} matchers
            .service(todos::complete_all)
            .service(todos::list_todos)
            .service(todos::create_todo)
            .service(todos::get_todo)
            .service(todos::update_todo)
            .service(todos::delete_todo),
    );
}
