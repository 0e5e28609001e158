//! Interactive client that signs users in against Keycloak and calls the
//! resource server on their behalf.
//!
//! | Method | Endpoint                    | Auth    | Description                          |
//! |--------|-----------------------------|---------|--------------------------------------|
//! | GET    | `/`                         | none    | Links to the pages below             |
//! | GET    | `/secure`                   | session | Greets the signed-in user            |
//! | GET    | `/call-api`                 | session | Calls `{api_base_url}/me` as the user |
//! | GET    | `/login`                    | none    | Starts the authorization-code flow   |
//! | GET    | `/logout`                   | none    | Ends the local and provider sessions |
//! | GET    | `{callback_path}`           | none    | Authorization-code redirect target   |
//! | GET    | `{signed_out_callback_path}`| none    | Post-logout redirect target          |

pub mod api_client;
pub mod handler;
pub mod oidc_client;
pub mod routes;
pub mod session;
pub mod state;

pub use state::WebState;
