//! Sample content written to an empty store on first launch.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use taskboard_proto::task::{Task, TaskId, TaskPriority, TaskStatus};

/// Number of tasks in a fresh seed set.
pub const SEED_TASK_COUNT: usize = 20;

/// Oldest a seeded `createdAt` may be, in days.
const CREATED_WINDOW_DAYS: i64 = 30;
/// Oldest a seeded `updatedAt` may be, in days.
const UPDATED_WINDOW_DAYS: i64 = 7;
/// Chance that a seeded task has an assignee.
const ASSIGNED_PROBABILITY: f64 = 0.7;

const TITLES: [&str; 20] = [
    "Implement user authentication",
    "Design landing page mockup",
    "Fix login bug on mobile",
    "Add dark mode support",
    "Optimize database queries",
    "Write API documentation",
    "Create user dashboard",
    "Fix responsive layout issues",
    "Add email notifications",
    "Implement search functionality",
    "Refactor authentication service",
    "Add unit tests for utils",
    "Design new logo",
    "Update dependencies",
    "Fix memory leak in component",
    "Add error boundary",
    "Create onboarding flow",
    "Implement file upload",
    "Add analytics tracking",
    "Optimize bundle size",
];

const DESCRIPTIONS: [&str; 20] = [
    "Implement secure user authentication with JWT tokens and refresh token mechanism.",
    "Create a modern and responsive landing page design with animations.",
    "Fix the login form bug that occurs on mobile devices when keyboard appears.",
    "Add dark mode toggle with system preference detection and manual override.",
    "Optimize slow database queries by adding proper indexes and query optimization.",
    "Write comprehensive API documentation with examples and code snippets.",
    "Build a user dashboard with widgets, charts, and activity feed.",
    "Fix responsive layout issues on tablet devices and improve mobile experience.",
    "Implement email notification system for important user actions.",
    "Add full-text search functionality with filters and sorting options.",
    "Refactor authentication service to improve code quality and maintainability.",
    "Add comprehensive unit tests for utility functions and helpers.",
    "Design a new logo that reflects the brand identity and values.",
    "Update all project dependencies to latest stable versions.",
    "Fix memory leak in a view component that causes performance degradation.",
    "Add error boundary components to catch and handle rendering errors gracefully.",
    "Create an engaging onboarding flow for new users.",
    "Implement secure file upload with progress tracking and validation.",
    "Add analytics tracking for user behavior and feature usage.",
    "Optimize bundle size by code splitting and lazy loading components.",
];

const ASSIGNEES: [&str; 8] = [
    "John Doe",
    "Jane Smith",
    "Mike Johnson",
    "Sarah Williams",
    "David Brown",
    "Emily Davis",
    "Chris Wilson",
    "Amy Martinez",
];

const TAGS: [&str; 10] = [
    "frontend",
    "backend",
    "bug",
    "feature",
    "urgent",
    "design",
    "testing",
    "documentation",
    "refactor",
    "performance",
];

/// Generates [`SEED_TASK_COUNT`] sample tasks relative to `now`.
///
/// Titles and descriptions cycle through a fixed catalog; status, priority,
/// assignee, tags and timestamps are random. `updatedAt` is never earlier
/// than `createdAt`, and neither lies in the future.
pub fn generate_seed_tasks<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<Task> {
    (0..SEED_TASK_COUNT)
        .map(|i| seed_task(rng, now, i))
        .collect()
}

fn seed_task<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, index: usize) -> Task {
    let created_at = random_past(rng, now, CREATED_WINDOW_DAYS);
    let updated_at = random_past(rng, now, UPDATED_WINDOW_DAYS).max(created_at);

    let assignee = if rng.random_bool(ASSIGNED_PROBABILITY) {
        ASSIGNEES.choose(rng).copied().unwrap_or_default().to_string()
    } else {
        String::new()
    };

    let tag_count = rng.random_range(1..=3);
    let tags = TAGS
        .choose_multiple(rng, tag_count)
        .map(|t| (*t).to_string())
        .collect();

    Task {
        id: TaskId::from_string(format!("dummy-{}-{index}", now.timestamp_millis())),
        title: TITLES[index % TITLES.len()].to_string(),
        description: DESCRIPTIONS[index % DESCRIPTIONS.len()].to_string(),
        status: *TaskStatus::ALL.choose(rng).unwrap_or(&TaskStatus::Backlog),
        priority: *TaskPriority::ALL.choose(rng).unwrap_or(&TaskPriority::Medium),
        assignee,
        tags,
        created_at,
        updated_at,
    }
}

/// A random instant between `days` days ago and `now`.
fn random_past<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let window_secs = days * 24 * 60 * 60;
    now - Duration::seconds(rng.random_range(0..=window_secs))
}
