//! User directory and approval queue.
//!
//! End-user accounts sign up from the mobile app and wait here for an
//! admin to approve their ID documents. Sign-in state lives at the auth
//! provider; everything else is read from the live user cache.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users` | Approval cards (end-user accounts only) |
//! | GET | `/api/users/{uid}` | Full profile with ID images |
//! | POST | `/api/users/{uid}/approve` | Mark the account approved |
//! | POST | `/api/users/{uid}/resubmit-id` | Request new ID documents |
//! | POST | `/api/users/{uid}/disable` | Toggle sign-in at the auth provider |
//! | GET | `/api/users/{uid}/auth` | Auth-provider record for the account |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
