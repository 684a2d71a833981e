/// Kinetics of a reaction network as an initial value problem.
/// Every molecule of the network is a state variable (its concentration), every edge
/// substrate -> product is a first-order flux k*[substrate]:
///
/// d[X]/dt = sum over edges s->X of k*[s] - sum over edges X->p of k*[X]
///
/// The system is assembled from symbolic expressions and integrated by the universal
/// ODE solver of RustedSciThe, the result is resampled onto a uniform time grid.
///
///  # Examples
/// ```rust, ignore
/// use KeggKinetics::Kinetics::network_kinetics_IVP::NetworkKineticsIVP;
/// let mut ivp = NetworkKineticsIVP::new(&network);
/// ivp.set_time_span(0.0, 10.0, 100)?;
/// let trajectory = ivp.solve()?;
/// ```
#[allow(non_snake_case)]
pub mod network_kinetics_IVP;
/// concentration time series produced by the simulation
pub mod trajectory;
