use rocket::Route;

mod polls;
pub mod response;

pub fn routes() -> Vec<Route> {
    polls::routes()
}
