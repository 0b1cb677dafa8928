use futures::try_join;
use shared::protocol::{Course, DashboardStats, Enrollment, Person};
use tracing::{error, info};

use crate::{endpoint::CollectionEndpoint, error::Result, screen::fetch_collection};

/// Fetches the three collections concurrently and counts them.
pub async fn load_dashboard(endpoint: &dyn CollectionEndpoint) -> Result<DashboardStats> {
    let result = try_join!(
        fetch_collection::<Person>(endpoint),
        fetch_collection::<Course>(endpoint),
        fetch_collection::<Enrollment>(endpoint)
    );
    let (people, courses, enrollments) = match result {
        Ok(collections) => collections,
        Err(err) => {
            error!(error = %err, "failed to load dashboard statistics");
            return Err(err);
        }
    };

    let stats = DashboardStats {
        total_people: people.len(),
        total_courses: courses.len(),
        active_courses: courses.iter().filter(|course| course.active).count(),
        total_enrollments: enrollments.len(),
    };
    info!(?stats, "dashboard loaded");
    Ok(stats)
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
