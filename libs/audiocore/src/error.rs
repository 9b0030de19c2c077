use thiserror::Error;

/// A diagnostic message surfaced by a backend, carried inside [`Error::Backend`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(String);

impl BackendError {
    /// Creates a new [`BackendError`] with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An error that might occur when interacting with the API.
///
/// This is the discriminated result code taxonomy: every fallible operation
/// in the crate returns one of these variants (wrapped in a `Result`).
#[derive(Debug, Clone, Error)]
pub enum Error {
    // Argument errors.
    /// An argument passed to the API was invalid.
    #[error("invalid argument")]
    InvalidArgs,
    /// The provided device configuration cannot be satisfied.
    #[error("the requested device configuration cannot be satisfied")]
    InvalidDeviceConfig,

    // Resource errors.
    /// Allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// No backend could be selected during context initialization.
    #[error("no backend is available on this platform")]
    NoBackend,
    /// No matching device was found.
    #[error("no matching device was found")]
    NoDevice,
    /// The requested operation is not implemented by the selected backend.
    #[error("the requested operation is not implemented by the selected backend")]
    ApiNotFound,
    /// The device could not be accessed (e.g. insufficient permissions).
    #[error("access to the device was denied")]
    AccessDenied,

    // State errors.
    /// The device has not been initialized (or has already been uninitialized).
    #[error("the device has not been initialized")]
    DeviceNotInitialized,
    /// The device is mid-transition (STOPPING) and cannot accept the request yet.
    #[error("the device is busy (currently stopping)")]
    DeviceBusy,
    /// `start()` was called on a device that is already STARTED.
    #[error("the device is already started")]
    DeviceAlreadyStarted,
    /// `start()` was called on a device that is already STARTING.
    #[error("the device is already starting")]
    DeviceAlreadyStarting,
    /// `stop()` was called on a device that is already STOPPED.
    #[error("the device is already stopped")]
    DeviceAlreadyStopped,
    /// `stop()` was called on a device that is already STOPPING.
    #[error("the device is already stopping")]
    DeviceAlreadyStopping,

    // I/O errors.
    /// The application's `onRecv` callback failed to consume captured data.
    #[error("failed to read data from the application callback")]
    FailedToReadDataFromClient,
    /// The application's `onSend` callback failed to produce data to play.
    #[error("failed to send data to the application callback")]
    FailedToSendDataToClient,
    /// The backend failed to read data from the device.
    #[error("failed to read data from the device")]
    FailedToReadDataFromDevice,
    /// The backend failed to send data to the device.
    #[error("failed to send data to the device")]
    FailedToSendDataToDevice,
    /// The backend could not map its buffer into process memory.
    #[error("failed to map the device's buffer")]
    FailedToMapDeviceBuffer,
    /// The backend failed to open the native device.
    #[error("failed to open the backend device")]
    FailedToOpenBackendDevice,
    /// The backend failed to start streaming.
    #[error("failed to start the backend device")]
    FailedToStartBackendDevice,
    /// The backend failed to stop streaming.
    #[error("failed to stop the backend device")]
    FailedToStopBackendDevice,

    // Setup errors.
    /// None of the device's supported formats satisfy the request.
    #[error("the requested format is not supported")]
    FormatNotSupported,
    /// The backend could not be initialized (probe failed).
    #[error("failed to initialize the backend")]
    FailedToInitBackend,
    /// A platform mutex could not be created.
    #[error("failed to create a mutex")]
    FailedToCreateMutex,
    /// A platform event could not be created.
    #[error("failed to create an event")]
    FailedToCreateEvent,
    /// The worker thread could not be spawned.
    #[error("failed to create the worker thread")]
    FailedToCreateThread,

    /// Indicates that an error occurred in the backend, with a diagnostic message.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Generic, unclassified error.
    #[error("an unspecified error occurred")]
    Error,
}
