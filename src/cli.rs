use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Recommends assessments for a job description or query", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the recommender as an HTTP service.
    Daemon {
        /// Address to listen on, overrides server.listen
        #[clap(long)]
        listen: Option<String>,
    },
    /// Recommend assessments for a query or a web page
    Recommend {
        /// Job description or free-text query
        #[clap(allow_hyphen_values = true)]
        query: Option<String>,

        /// Use the leading paragraphs of this page as the query
        #[clap(short, long)]
        url: Option<String>,

        /// Minimum similarity; results must score strictly above it
        #[clap(short, long, allow_hyphen_values = true)]
        threshold: Option<f32>,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,
    },
    /// Print the catalog
    Catalog {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend() {
        let args = Args::try_parse_from([
            "shlrec",
            "recommend",
            "numerical reasoning",
            "--threshold",
            "0.5",
            "-l",
            "3",
        ])
        .unwrap();

        match args.command {
            Command::Recommend {
                query,
                url,
                threshold,
                limit,
            } => {
                assert_eq!(query.as_deref(), Some("numerical reasoning"));
                assert_eq!(url, None);
                assert_eq!(threshold, Some(0.5));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_recommend_url() {
        let args =
            Args::try_parse_from(["shlrec", "recommend", "--url", "https://example.com/job"])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::Recommend { query: None, url: Some(_), .. }
        ));
    }

    #[test]
    fn test_parse_daemon_listen() {
        let args = Args::try_parse_from(["shlrec", "daemon", "--listen", "127.0.0.1:9000"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Daemon { listen: Some(ref l) } if l == "127.0.0.1:9000"
        ));
    }
}
