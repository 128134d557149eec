//! Permissions and the events the host environment delivers.
//!
//! On a phone the operating system owns the location permissions and answers
//! a permission request some time later through a callback. Here the answer
//! is a [HostEvent] message sent back to whoever drives the
//! [Workflow](crate::workflow::Workflow).

use tokio::sync::mpsc::UnboundedSender;

/// The request code used when asking for the location permissions.
pub const LOCATION_PERMISSION_REQUEST_CODE: u32 = 100;

/// A permission the host can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Access to precise (satellite) location.
    FineLocation,
    /// Access to approximate (network) location.
    CoarseLocation,
}

/// The location permissions currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Authorization {
    /// Whether [Permission::FineLocation] has been granted.
    pub fine: bool,
    /// Whether [Permission::CoarseLocation] has been granted.
    pub coarse: bool,
}

impl Authorization {
    /// Both location permissions.
    pub const FULL: Authorization = Authorization {
        fine: true,
        coarse: true,
    };

    /// Whether both fine and coarse location have been granted.
    pub fn is_fully_granted(&self) -> bool {
        self.fine && self.coarse
    }

    /// Mark `permission` as granted.
    pub fn grant(&mut self, permission: Permission) {
        match permission {
            Permission::FineLocation => self.fine = true,
            Permission::CoarseLocation => self.coarse = true,
        }
    }
}

/// A request for the host to ask the user for permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequest {
    /// Echoed back in the matching [HostEvent::PermissionResult].
    pub code: u32,
    /// The permissions being asked for.
    pub permissions: Vec<Permission>,
}

impl PermissionRequest {
    /// The request for both location permissions.
    pub fn location() -> Self {
        Self {
            code: LOCATION_PERMISSION_REQUEST_CODE,
            permissions: vec![Permission::FineLocation, Permission::CoarseLocation],
        }
    }
}

/// An event delivered by the host after the workflow has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The user answered a [PermissionRequest].
    PermissionResult {
        /// The code of the request being answered.
        code: u32,
        /// Whether each requested permission was granted.
        grants: Vec<(Permission, bool)>,
    },
}

impl HostEvent {
    /// Whether this event grants every permission of the location request.
    ///
    /// An empty grant list counts as a denial, which is what the host sends
    /// when the request was cancelled.
    pub fn grants_location(&self) -> bool {
        match self {
            HostEvent::PermissionResult { code, grants } => {
                *code == LOCATION_PERMISSION_REQUEST_CODE
                    && !grants.is_empty()
                    && grants.iter().all(|(_, granted)| *granted)
            }
        }
    }
}

/// The part of the host environment that manages permissions.
pub trait PermissionHost {
    /// The permissions held right now.
    fn authorization(&self) -> Authorization;

    /// Ask the user for permissions.
    ///
    /// Must return without waiting for the answer, which arrives later as a
    /// [HostEvent::PermissionResult].
    fn request_permissions(&mut self, request: PermissionRequest);
}

/// A host whose user answers every permission request the same way.
///
/// Answers are sent on the channel given to [SimulatedHost::new].
#[derive(Debug)]
pub struct SimulatedHost {
    authorization: Authorization,
    approve_requests: bool,
    events: UnboundedSender<HostEvent>,
}

impl SimulatedHost {
    /// Create a host that starts with `authorization` and answers requests
    /// by granting everything when `approve_requests` is true and denying
    /// everything otherwise.
    pub fn new(
        authorization: Authorization,
        approve_requests: bool,
        events: UnboundedSender<HostEvent>,
    ) -> Self {
        Self {
            authorization,
            approve_requests,
            events,
        }
    }
}

impl PermissionHost for SimulatedHost {
    fn authorization(&self) -> Authorization {
        self.authorization
    }

    fn request_permissions(&mut self, request: PermissionRequest) {
        tracing::info!("Requesting permissions {:?}", request.permissions);

        if self.approve_requests {
            for permission in &request.permissions {
                self.authorization.grant(*permission);
            }
        }

        let grants = request
            .permissions
            .iter()
            .map(|permission| (*permission, self.approve_requests))
            .collect();

        let event = HostEvent::PermissionResult {
            code: request.code,
            grants,
        };

        if self.events.send(event).is_err() {
            tracing::warn!("Nobody is listening for the permission result, dropping it.");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::{
        Authorization, HostEvent, LOCATION_PERMISSION_REQUEST_CODE, Permission, PermissionHost,
        PermissionRequest, SimulatedHost,
    };

    #[test]
    fn full_authorization_needs_both_permissions() {
        assert!(!Authorization::default().is_fully_granted());
        assert!(
            !Authorization {
                fine: true,
                coarse: false
            }
            .is_fully_granted()
        );
        assert!(
            !Authorization {
                fine: false,
                coarse: true
            }
            .is_fully_granted()
        );
        assert!(Authorization::FULL.is_fully_granted());
    }

    #[test]
    fn grant_sets_matching_flag() {
        let mut authorization = Authorization::default();

        authorization.grant(Permission::CoarseLocation);
        assert_eq!(
            authorization,
            Authorization {
                fine: false,
                coarse: true
            }
        );

        authorization.grant(Permission::FineLocation);
        assert!(authorization.is_fully_granted());
    }

    #[test]
    fn result_grants_location_only_when_all_granted() {
        let granted = HostEvent::PermissionResult {
            code: LOCATION_PERMISSION_REQUEST_CODE,
            grants: vec![
                (Permission::FineLocation, true),
                (Permission::CoarseLocation, true),
            ],
        };
        let partial = HostEvent::PermissionResult {
            code: LOCATION_PERMISSION_REQUEST_CODE,
            grants: vec![
                (Permission::FineLocation, false),
                (Permission::CoarseLocation, true),
            ],
        };
        let cancelled = HostEvent::PermissionResult {
            code: LOCATION_PERMISSION_REQUEST_CODE,
            grants: vec![],
        };
        let other_request = HostEvent::PermissionResult {
            code: 7,
            grants: vec![(Permission::FineLocation, true)],
        };

        assert!(granted.grants_location());
        assert!(!partial.grants_location());
        assert!(!cancelled.grants_location());
        assert!(!other_request.grants_location());
    }

    #[test]
    fn simulated_host_approves_request() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut host = SimulatedHost::new(Authorization::default(), true, sender);

        host.request_permissions(PermissionRequest::location());

        assert!(host.authorization().is_fully_granted());
        let event = receiver.try_recv().expect("Expected a permission result");
        assert!(event.grants_location());
    }

    #[test]
    fn simulated_host_denies_request() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut host = SimulatedHost::new(Authorization::default(), false, sender);

        host.request_permissions(PermissionRequest::location());

        assert_eq!(host.authorization(), Authorization::default());
        assert_eq!(
            receiver.try_recv(),
            Ok(HostEvent::PermissionResult {
                code: LOCATION_PERMISSION_REQUEST_CODE,
                grants: vec![
                    (Permission::FineLocation, false),
                    (Permission::CoarseLocation, false),
                ],
            })
        );
    }

    #[test]
    fn simulated_host_survives_closed_channel() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let mut host = SimulatedHost::new(Authorization::default(), true, sender);

        host.request_permissions(PermissionRequest::location());

        assert!(host.authorization().is_fully_granted());
    }
}
