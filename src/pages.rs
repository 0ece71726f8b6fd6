//! Server-rendered HTML pages.
//!
//! SYSTEM CONTEXT
//! ==============
//! These are the document shells the browser and the mobile wrapper load
//! first. Interactive behaviour (forms posting to Supabase, the planner UI)
//! is attached client-side; the server only guarantees the structure the
//! navigation and auth flows depend on: titles, headings, links, and the
//! loading placeholder.

use maud::{DOCTYPE, Markup, html};

pub const PRODUCT_NAME: &str = "BestMealMate";
const TAGLINE: &str = "AI Meal Planning for Families";
const BRAND_COLOR: &str = "#10B981";

/// One purchasable plan on the onboarding page.
struct Plan {
    name: &'static str,
    price: &'static str,
    blurb: &'static str,
}

const PLANS: [Plan; 2] = [
    Plan { name: "Premium", price: "$9.99", blurb: "Unlimited AI suggestions for your household" },
    Plan { name: "Family", price: "$14.99", blurb: "Everything in Premium for up to 8 family members" },
];

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="theme-color" content=(BRAND_COLOR);
                title { (title) }
            }
            body class="min-h-screen bg-white text-gray-900" {
                (body)
            }
        }
    }
}

fn page_title(section: Option<&str>) -> String {
    match section {
        Some(section) => format!("{section} | {PRODUCT_NAME}"),
        None => format!("{PRODUCT_NAME} - {TAGLINE}"),
    }
}

/// Centered spinner shown while a route's data loads.
#[must_use]
pub fn loading_placeholder() -> Markup {
    html! {
        div class="min-h-screen flex items-center justify-center bg-gradient-to-br from-green-50 via-emerald-50 to-teal-50"
            role="status" aria-label="Loading" {
            div class="w-10 h-10 border-3 border-green-200 border-t-green-600 rounded-full animate-spin" {}
        }
    }
}

// =============================================================================
// PAGES
// =============================================================================

#[must_use]
pub fn landing() -> Markup {
    layout(
        &page_title(None),
        html! {
            nav class="flex justify-between items-center px-6 h-16" {
                a href="/" class="text-2xl font-bold" { (PRODUCT_NAME) }
                div class="flex items-center gap-4" {
                    a href="/login" class="font-medium text-gray-700" { "Log in" }
                    a href="/onboarding" class="btn-primary" { "Get started" }
                }
            }
            main class="max-w-5xl mx-auto px-6 pt-20 text-center" {
                h1 class="text-5xl font-extrabold mb-6" { "Meal planning for real families" }
                p class="text-xl text-gray-600 mb-8" {
                    "Different tastes. Allergies. Picky eaters. Expiring food. "
                    "The endless \"what's for dinner?\" question. We solve all of it."
                }
                a href="/onboarding" class="btn-primary text-lg px-8 py-4" { "Start Planning Free" }
            }
        },
    )
}

#[must_use]
pub fn login(error: Option<&str>) -> Markup {
    layout(
        &page_title(Some("Log in")),
        html! {
            main class="max-w-md mx-auto px-6 py-16" {
                h1 class="text-3xl font-bold mb-2" { "Welcome back" }
                p class="text-gray-600 mb-8" { "Log in to plan this week's meals." }
                @if error.is_some() {
                    p class="text-red-600 mb-4" role="alert" { "Sign-in failed. Please try again." }
                }
                form id="login-form" class="space-y-4" {
                    div {
                        label for="email" class="block text-sm font-medium mb-2" { "Email" }
                        input id="email" name="email" type="email" autocomplete="email" required
                            placeholder="you@example.com";
                    }
                    div {
                        label for="password" class="block text-sm font-medium mb-2" { "Password" }
                        input id="password" name="password" type="password" autocomplete="current-password" required;
                    }
                    button type="submit" class="btn-primary w-full" { "Log in" }
                }
                p class="mt-6 text-sm text-gray-600" {
                    "New here? " a href="/onboarding" { "Create an account" }
                }
            }
        },
    )
}

#[must_use]
pub fn onboarding() -> Markup {
    layout(
        &page_title(Some("Get started")),
        html! {
            main class="max-w-3xl mx-auto px-6 py-16" {
                h1 class="text-3xl font-bold mb-2 text-center" { "Welcome to " (PRODUCT_NAME) }
                p class="text-gray-600 mb-10 text-center" { "Create your account in seconds" }
                section class="grid gap-6 md:grid-cols-2" aria-label="Plans" {
                    @for plan in &PLANS {
                        article class="rounded-xl border p-6" data-plan=(plan.name.to_lowercase()) {
                            h2 class="text-xl font-bold" { (plan.name) }
                            p class="text-3xl font-extrabold my-2" { (plan.price) span class="text-base" { "/month" } }
                            p class="text-gray-600" { (plan.blurb) }
                        }
                    }
                }
            }
        },
    )
}

/// Dashboard document: navigation plus the loading placeholder the client
/// app replaces once household data arrives.
#[must_use]
pub fn dashboard(path: &str) -> Markup {
    layout(
        &page_title(Some("Dashboard")),
        html! {
            aside class="fixed left-0 top-0 bottom-0 w-64 border-r p-4 hidden lg:block" {
                a href="/dashboard" class="text-xl font-bold" { (PRODUCT_NAME) }
                nav class="mt-8 space-y-2" {
                    a href="/dashboard/plan" { "Meal plan" }
                    a href="/dashboard/recipes" { "Recipes" }
                    a href="/dashboard/groceries" { "Groceries" }
                    a href="/dashboard/family" { "Family" }
                    a href="/dashboard/settings" { "Settings" }
                }
            }
            main id="app" class="lg:ml-64" data-route=(path) {
                (loading_placeholder())
            }
        },
    )
}

#[must_use]
pub fn reset_password() -> Markup {
    layout(
        &page_title(Some("Reset password")),
        html! {
            main class="max-w-md mx-auto px-6 py-16" {
                h1 class="text-2xl font-bold mb-2" { "Set a new password" }
                form id="reset-password-form" class="space-y-4" {
                    div {
                        label for="password" class="block text-sm font-medium mb-2" { "New password" }
                        input id="password" name="password" type="password" autocomplete="new-password" minlength="8" required;
                    }
                    div {
                        label for="confirm-password" class="block text-sm font-medium mb-2" { "Confirm password" }
                        input id="confirm-password" name="confirmPassword" type="password" autocomplete="new-password" required;
                    }
                    button type="submit" class="btn-primary w-full" { "Update password" }
                }
            }
        },
    )
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
