pub mod advanced_protocol;
pub mod cluster_network;
pub mod distributed;
pub mod ports;
pub mod protocol;
pub mod server;

pub use advanced_protocol::{
    BackendNode, BufferPool, CircuitBreaker, CircuitState, CompressionType, ConnectionPool,
    ConnectionState, ConnectionStateMachine, ExtensionRegistry, FlowControlManager,
    LoadBalancingStrategy, MessageType, ProtocolHealthStatus, ProtocolLoadBalancer,
    ProtocolManager, ProtocolVersion, RateLimiter, RequestPriority, WireCodec,
};
pub use cluster_network::{
    ClusterLoadBalancer, ClusterMessage, ClusterNetworkManager, ClusterTopologyManager,
    FailoverCoordinator, HealthCheckResult, MembershipEvent, MessagePriority, NetworkHealthMonitor,
    NodeConnectionPool, NodeId, NodeInfo, NodeState, RoutingStrategy,
};
pub use ports::{
    AddressResolver, AllocationStrategy, FirewallManager, ListenerConfig, ListenerManager,
    NatTraversal, PortAllocator, PortConfig, PortHealthChecker, PortManager, PortMappingService,
    ServiceType,
};
pub use protocol::{Request, Response};
pub use server::Server;
