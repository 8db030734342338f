use sqlx::MySqlPool;

/// The two database instances the application talks to: the HR schema it
/// owns, and the read-only time tracker it joins against by employee email.
#[derive(Clone)]
pub struct Databases {
    pub hr: MySqlPool,
    pub tracker: MySqlPool,
}

pub async fn init_db(hr_url: &str, tracker_url: &str) -> Databases {
    let hr = MySqlPool::connect(hr_url)
        .await
        .expect("Failed to connect to HR database");
    let tracker = MySqlPool::connect(tracker_url)
        .await
        .expect("Failed to connect to tracker database");
    Databases { hr, tracker }
}
